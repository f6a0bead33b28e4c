//! Whole-pipeline check of IMPLICIT/EXPLICIT tag overrides: source text in,
//! generated Rust source out, via the public [`AsnpackCompiler`] builder.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use asnpack_compiler::{AsnpackCompiler, CompileError};

fn tempfile_dir() -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("asnpack-compiler-implicit-tag-test-{}-{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn implicit_tag_overrides_the_underlying_tag_in_the_packer_program() {
    let dir = tempfile_dir();
    let module = write_file(
        &dir,
        "tags.asn1",
        "Tags DEFINITIONS ::= BEGIN\nWrapped ::= [3] IMPLICIT OCTET STRING\nEND\n",
    );
    let generated = AsnpackCompiler::new([module]).build().unwrap();
    assert!(generated["Tags"].contains("pub const DER_PACK_TAGS_WRAPPED"));
}

#[test]
fn explicit_tag_wraps_the_underlying_type_in_its_own_constructed_layer() {
    let dir = tempfile_dir();
    let module = write_file(
        &dir,
        "tags.asn1",
        "Tags DEFINITIONS ::= BEGIN\nWrapped ::= [3] EXPLICIT OCTET STRING\nEND\n",
    );
    let generated = AsnpackCompiler::new([module]).build().unwrap();
    assert!(generated["Tags"].contains("pub const DER_PACK_TAGS_WRAPPED"));
}

#[test]
fn implicit_tagging_a_choice_is_rejected_rather_than_silently_applied() {
    let dir = tempfile_dir();
    let module = write_file(
        &dir,
        "tags.asn1",
        "Tags DEFINITIONS ::= BEGIN\n\
         Inner ::= CHOICE { a [0] IMPLICIT INTEGER, b [1] IMPLICIT INTEGER }\n\
         Outer ::= [5] IMPLICIT Inner\n\
         END\n",
    );
    let err = AsnpackCompiler::new([module]).build().unwrap_err();
    assert!(matches!(
        err,
        CompileError::ImplicitTagOnChoiceOrAny { ref module, ref type_name }
            if module == "Tags" && type_name == "Outer"
    ));
}

#[test]
fn an_implicit_tag_override_on_a_field_within_a_sequence_leaves_sibling_fields_untouched() {
    let dir = tempfile_dir();
    let module = write_file(
        &dir,
        "tags.asn1",
        "Tags DEFINITIONS ::= BEGIN\n\
         Holder ::= SEQUENCE {\n\
           tagged [2] IMPLICIT INTEGER,\n\
           plain OCTET STRING\n\
         }\n\
         END\n",
    );
    let generated = AsnpackCompiler::new([module]).build().unwrap();
    let source = &generated["Tags"];
    assert!(source.contains("pub struct TagsHolder"));
    assert!(source.contains("pub const DER_PACK_TAGS_HOLDER"));
}
