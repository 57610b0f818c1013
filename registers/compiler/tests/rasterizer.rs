// Licensed under the Apache-2.0 license

use log::LevelFilter;
use manjuu_csr::{
    prefix, ChannelPairBuilder, CompileError, Compiler, CompilerConfig, ConstantTable,
    DefaultValue, DescriptorList, Direction, FieldDescriptor, Frozen, Rule, Side, TransferPolicy,
};
use simple_logger::SimpleLogger;

fn setup() -> Compiler {
    // Initialize log level to info (only once)
    let _ = SimpleLogger::new().with_level(LevelFilter::Info).init();

    let mut constants = ConstantTable::new();
    constants
        .define_enum("FMT", &["Y8", "RGB565", "RGBA8888"])
        .unwrap();
    constants.define("ROP_MASK_ALL", "4'hf").unwrap();
    Compiler::new(constants.freeze(), CompilerConfig::default())
}

fn rop_csr_t() -> DescriptorList {
    DescriptorList::inputs(vec![
        FieldDescriptor::new("fmt", 2)
            .unwrap()
            .with_default(DefaultValue::parse("FMT_RGB565").unwrap()),
        FieldDescriptor::new("mask", 4)
            .unwrap()
            .with_default(DefaultValue::parse("ROP_MASK_ALL").unwrap()),
        FieldDescriptor::new("base", 32).unwrap(),
    ])
    .unwrap()
}

fn setup_csr_t() -> DescriptorList {
    let mut fields: Vec<_> = ["x0", "y0", "x1", "y1", "x2", "y2"]
        .into_iter()
        .map(|n| FieldDescriptor::new(n, 13).unwrap())
        .collect();
    fields.push(FieldDescriptor::new("trigger_valid", 1).unwrap());
    fields.push(FieldDescriptor::output("trigger_ready", 1).unwrap());
    DescriptorList::inputs(fields).unwrap()
}

fn ras_req_t() -> DescriptorList {
    let edges = [
        ("left_edge", 13),
        ("right_edge", 13),
        ("upper_edge", 13),
        ("lower_edge", 13),
        ("edge0", 28),
        ("edge1", 28),
        ("edge2", 28),
        ("step0x", 13),
        ("step0y", 13),
        ("step1x", 13),
        ("step1y", 13),
        ("step2x", 13),
        ("step2y", 13),
    ];
    DescriptorList::inputs(
        edges
            .into_iter()
            .map(|(n, w)| FieldDescriptor::input(n, w).unwrap())
            .collect(),
    )
    .unwrap()
}

fn ras_resp_t() -> DescriptorList {
    DescriptorList::outputs(vec![
        FieldDescriptor::new("x", 13).unwrap(),
        FieldDescriptor::new("y", 13).unwrap(),
    ])
    .unwrap()
}

#[test]
fn test_full_unit() {
    let compiler = setup();

    let csr_t = compiler
        .compile_map(
            "csr_t",
            &[
                prefix("rop", &rop_csr_t()).unwrap(),
                prefix("setup", &setup_csr_t()).unwrap(),
            ],
        )
        .unwrap();
    assert_eq!(csr_t.total_width(), 38 + 80);
    assert_eq!(csr_t.len(), 11);

    let mut ras = ChannelPairBuilder::new("ras").unwrap();
    ras.request_list(&ras_req_t())
        .unwrap()
        .response_list(&ras_resp_t())
        .unwrap();
    let ras = compiler.compile_channel(&ras).unwrap();
    assert_eq!(ras.request().payload_width(), 4 * 13 + 3 * 28 + 6 * 13);
    assert_eq!(ras.response().payload_width(), 26);
    assert_eq!(ras.policy(), TransferPolicy::SingleOutstanding);

    let unit = compiler.emit(&[csr_t], &[ras]);
    let listing = unit.render_listing();
    println!("{listing}");
    assert!(listing.contains("FMT_RGBA8888 = 2'd2"));
    assert!(listing.contains("[1:0]     input  rop_fmt = FMT_RGB565 @ 0\n"));
    assert!(listing.contains("          input  ras_resp_ready\n"));

    let json: serde_json::Value = serde_json::from_str(&unit.to_json().unwrap()).unwrap();
    assert_eq!(json["register_maps"][0]["csrs"][10]["name"], "setup_trigger_ready");
    assert_eq!(json["register_maps"][0]["csrs"][10]["address"], 40);
    assert_eq!(json["channels"][0]["response"]["valid"]["direction"], "output");
}

#[test]
fn test_response_input_rejected() {
    let mut ras = ChannelPairBuilder::new("ras").unwrap();
    ras.response_list(&ras_resp_t()).unwrap();

    // A response list written with "i" tags, as some schemas do
    let tagged = DescriptorList::inputs(vec![FieldDescriptor::input("z", 8).unwrap()]).unwrap();
    let err = ras.response_list(&tagged).unwrap_err();
    assert_eq!(
        err,
        CompileError::DirectionMismatch {
            channel: "ras".into(),
            side: Side::Response,
            field: "z".into(),
            found: Direction::Input,
            expected: Direction::Output,
        }
    );
    assert_eq!(ras.response_len(), 2);
}

#[test]
fn test_revalidation_is_idempotent() {
    let compiler = setup();
    let map = compiler
        .compile_map("rop_csr_t", &[prefix("rop", &rop_csr_t()).unwrap()])
        .unwrap();
    let validator = manjuu_csr::Validator::new(compiler.constants(), compiler.config());
    let before = map.clone();
    validator.validate_map(&map).unwrap();
    validator.validate_map(&map).unwrap();
    assert_eq!(map, before);
}

#[test]
fn test_default_overflow() {
    let compiler = setup();
    let list = DescriptorList::inputs(vec![FieldDescriptor::new("mask", 3)
        .unwrap()
        .with_default(DefaultValue::parse("ROP_MASK_ALL").unwrap())])
    .unwrap();
    let diag = compiler
        .compile_map("rop_csr_t", &[prefix("rop", &list).unwrap()])
        .unwrap_err();
    assert_eq!(diag.rule, Rule::ConstantsResolve);
    assert_eq!(
        diag.error,
        CompileError::DefaultOverflow {
            field: "rop_mask".into(),
            width: 3,
            value: 15,
        }
    );
}

#[test]
fn test_shared_constants() {
    fn frozen() -> ConstantTable<Frozen> {
        let mut constants = ConstantTable::new();
        constants.define("A", "1'b1").unwrap();
        constants.freeze()
    }
    let table = std::sync::Arc::new(frozen());
    let a = Compiler::shared(table.clone(), CompilerConfig::default());
    let b = Compiler::shared(table, CompilerConfig::default().max_field_width(8));
    assert_eq!(a.constants().len(), b.constants().len());
    assert_eq!(b.config().max_field_width, 8);
}
