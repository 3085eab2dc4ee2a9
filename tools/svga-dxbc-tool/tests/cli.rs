#![cfg(not(target_arch = "wasm32"))]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use svga_dxbc::test_utils::ProgramBuilder;
use svga_dxbc::{DxbcContainer, ProgramType, SIGNATURE_HEADER_VERSION_0};
use tempfile::tempdir;

fn vertex_shader() -> Vec<u8> {
    ProgramBuilder::new(ProgramType::Vertex)
        .dcl_input(0, 0xf)
        .dcl_output_siv(0, 0xf, 1)
        .dcl_output(1, 0x3)
        .ret()
        .build()
}

#[test]
fn wrap_inspect_extract_roundtrip() {
    let dir = tempdir().unwrap();
    let code_path = dir.path().join("vs.bin");
    let dxbc_path = dir.path().join("vs.dxbc");
    let extracted_path = dir.path().join("vs.extracted.bin");
    let code = vertex_shader();
    fs::write(&code_path, &code).unwrap();

    cargo_bin_cmd!("svga-dxbc")
        .args([
            "wrap",
            code_path.to_str().unwrap(),
            "--output",
            dxbc_path.to_str().unwrap(),
            "--hexdump",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\n    0x44, 0x58, 0x42, 0x43,"))
        .stdout(predicate::str::ends_with(",\n};\n"));

    let dxbc = fs::read(&dxbc_path).unwrap();
    assert!(DxbcContainer::parse(&dxbc).unwrap().checksum_matches());

    cargo_bin_cmd!("svga-dxbc")
        .args(["inspect", dxbc_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("blob_count=3"))
        .stdout(predicate::str::contains("checksum ok"))
        .stdout(predicate::str::contains("SV_Position0"))
        .stdout(predicate::str::contains("OSGN (2 elements)"))
        .stdout(predicate::str::contains("SHDR vertex program, 13 tokens"));

    cargo_bin_cmd!("svga-dxbc")
        .args([
            "extract",
            dxbc_path.to_str().unwrap(),
            "-o",
            extracted_path.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(fs::read(&extracted_path).unwrap(), code);
}

#[test]
fn wrap_applies_guest_signatures() {
    let dir = tempdir().unwrap();
    let region_path = dir.path().join("region.bin");
    let dxbc_path = dir.path().join("out.dxbc");

    let code = vertex_shader();
    let mut region = code.clone();
    for word in [SIGNATURE_HEADER_VERSION_0, 0, 1, 0, 7, 0, 0xf, 0, 0] {
        region.extend_from_slice(&u32::to_le_bytes(word));
    }
    fs::write(&region_path, &region).unwrap();

    cargo_bin_cmd!("svga-dxbc")
        .args([
            "wrap",
            region_path.to_str().unwrap(),
            "-o",
            dxbc_path.to_str().unwrap(),
            "--code-size",
            &code.len().to_string(),
        ])
        .assert()
        .success();

    let dxbc = fs::read(&dxbc_path).unwrap();
    let container = DxbcContainer::parse(&dxbc).unwrap();
    assert_eq!(container.input_signature(), Some(Ok(Vec::new())));
    let outputs = container.output_signature().unwrap().unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].register, 7);
    assert_eq!(container.shader_code().unwrap(), &code[..]);
}

#[test]
fn validate_reports_errors() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.bin");
    let bad = dir.path().join("bad.bin");
    let code = vertex_shader();
    fs::write(&good, &code).unwrap();
    fs::write(&bad, &code[..code.len() - 4]).unwrap();

    cargo_bin_cmd!("svga-dxbc")
        .args(["validate", good.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (13 tokens)"));

    cargo_bin_cmd!("svga-dxbc")
        .args(["validate", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("declared token count"));

    cargo_bin_cmd!("svga-dxbc")
        .args(["inspect", good.to_str().unwrap()])
        .assert()
        .failure();
}
