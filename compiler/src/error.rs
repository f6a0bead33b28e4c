//! Errors produced while parsing, linking, and compiling ASN.1 modules
//! (C6/C7): the front-end's own parse failures, plus the linker's and
//! compiler's `Unresolved`/`Unimplemented` kinds.

use std::path::PathBuf;

use snafu::Snafu;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
    /// The `.asn1` notation front-end (`parser.rs`) rejected the source.
    #[snafu(display("{path}: {source}"))]
    Parse {
        path: PathBuf,
        source: Box<pest::error::Error<crate::parser::Rule>>,
    },

    /// A module file could not be read from disk.
    #[snafu(display("reading {path}: {source}"))]
    Io { path: PathBuf, source: std::io::Error },

    /// An `IMPORTS ... FROM M;` clause named a module not found on the
    /// include search path
    #[snafu(display("module {importer}: cannot find imported module {module}"))]
    UnresolvedModule { importer: String, module: String },

    /// A type reference named a type that does not exist in the resolved
    /// module (after import resolution).
    #[snafu(display("module {module}: type {name} is not defined"))]
    UnresolvedType { module: String, name: String },

    /// `REAL`/`RELATIVE-OID`, or an ASN.1 construct this front-end's
    /// grammar does not cover.
    #[snafu(display("module {module}, type {type_name}: {what} is not implemented"))]
    Unimplemented {
        module: String,
        type_name: String,
        what: &'static str,
    },

    /// `IMPLICIT`/explicit outer-tag override requested on a `CHOICE` or
    /// `ANY` type, which is forbidden: neither has a single leading tag to
    /// replace.
    #[snafu(display(
        "module {module}, type {type_name}: IMPLICIT tagging is not permitted on CHOICE or ANY"
    ))]
    ImplicitTagOnChoiceOrAny { module: String, type_name: String },

    /// A computed SET field ordering could not be determined because a
    /// member's leading tag could not be resolved statically, so program
    /// order cannot be arranged by ascending tag.
    #[snafu(display(
        "module {module}, type {type_name}: cannot determine a canonical tag for SET field {field}"
    ))]
    AmbiguousSetOrder {
        module: String,
        type_name: String,
        field: String,
    },

    /// `-l <lang>` named a backend other than `rust`, the only one
    /// implemented.
    #[snafu(display("unsupported output language {lang:?} (only \"rust\" is implemented)"))]
    UnsupportedLanguage { lang: String },

    /// `-t <spec>` used a syntax this driver does not recognise.
    #[snafu(display("invalid test-vector spec {spec:?}: {reason}"))]
    InvalidTestVectorSpec { spec: String, reason: &'static str },
}
