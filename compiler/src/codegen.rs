//! The Rust code-generation back-end — the only `-l` target implemented —
//! rendering one module's [`CompiledType`]s into the source text of its
//! generated `.rs` file.
//!
//! Renders one module's compiled types into `asnpack` packer-program byte
//! constants, recipe statics, sub-parser tables, and typed accessor views.

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

use crate::compiler::{CompiledType, RecipeIr};

/// Renders every type assignment compiled for `module` into that module's
/// generated Rust source. The result is meant to be written verbatim to a
/// file named after the module (e.g. `shapes.rs`) inside a crate that, like
/// `asnpack` itself, declares `extern crate alloc;`.
pub fn generate_module(module: &str, types: &[CompiledType]) -> String {
    let mut out = format!("//! Generated from the `{module}` ASN.1 module. Do not edit by hand.\n\n");
    for ty in types {
        out.push_str(&generate_type(module, ty));
        out.push('\n');
    }
    out
}

fn pack_const_name(module: &str, type_name: &str) -> String {
    format!("DER_PACK_{}_{}", module.to_shouty_snake_case(), type_name.to_shouty_snake_case())
}

fn pimp_const_name(module: &str, type_name: &str) -> String {
    format!("DER_PIMP_{}_{}", module.to_shouty_snake_case(), type_name.to_shouty_snake_case())
}

fn pimp_fn_name(module: &str, type_name: &str) -> String {
    format!("der_pimp_{}_{}", module.to_snake_case(), type_name.to_snake_case())
}

fn ovly_const_name(module: &str, type_name: &str) -> String {
    format!("DER_OVLY_{}_{}", module.to_shouty_snake_case(), type_name.to_shouty_snake_case())
}

fn psub_const_name(module: &str, type_name: &str) -> String {
    format!("DER_PSUB_{}_{}", module.to_shouty_snake_case(), type_name.to_shouty_snake_case())
}

fn view_struct_name(module: &str, type_name: &str) -> String {
    format!("{}{}", module.to_upper_camel_case(), type_name.to_upper_camel_case())
}

fn generate_type(module: &str, ty: &CompiledType) -> String {
    let pack_const = pack_const_name(module, &ty.name);
    let pimp_const = pimp_const_name(module, &ty.name);
    let pimp_fn = pimp_fn_name(module, &ty.name);
    let ovly_const = ovly_const_name(module, &ty.name);
    let psub_const = psub_const_name(module, &ty.name);
    let struct_name = view_struct_name(module, &ty.name);

    let base = format!("{}_{}", module.to_shouty_snake_case(), ty.name.to_shouty_snake_case());
    let mut sub = SubParserTable::new(&base);
    let recipe_expr = render_recipe(module, &ty.recipe, &mut sub);

    let mut out = String::new();
    out.push_str(&format!("/// Packer program for `{module}.{}`\n", ty.name));
    out.push_str(&format!("pub const {pack_const}: &[u8] = &{};\n\n", render_bytes(&ty.program)));

    out.push_str(&format!(
        "/// `{pack_const}` with its outermost `ENTER`/`STORE` tag byte replaced by\n\
         /// `implicit_tag`\n\
         pub fn {pimp_fn}(implicit_tag: u8) -> alloc::vec::Vec<u8> {{\n\
         \u{20}\u{20}\u{20}\u{20}let mut program = {pack_const}.to_vec();\n\
         \u{20}\u{20}\u{20}\u{20}program[0] = implicit_tag;\n\
         \u{20}\u{20}\u{20}\u{20}program\n\
         }}\n\
         #[allow(non_snake_case)]\n\
         pub use {pimp_fn} as {pimp_const};\n\n"
    ));

    out.push_str(&sub.declarations);

    out.push_str(&format!(
        "/// Sub-parser table for `{module}.{}`'s nested `SEQUENCE OF`/`SET OF`\n\
         /// element types and recursion-cut type references\n\
         pub static {psub_const}: &[asnpack::recipe::SubParser] = &[{}];\n\n",
        ty.name,
        sub.table_entries()
    ));

    out.push_str(&format!(
        "/// Compiled navigation recipe for `{module}.{}`\n\
         pub static {ovly_const}: asnpack::recipe::Recipe = {recipe_expr};\n\n",
        ty.name
    ));

    out.push_str(&generate_view_struct(&struct_name, &ovly_const, &ty.recipe));

    out
}

/// Accumulates the named `static` declarations a type's `Repeated` fields
/// need for their element program/recipe (the `DER_PSUB_M_T` table), so
/// [`render_recipe`] can reference them by name instead of inlining
/// anonymous sub-trees.
struct SubParserTable {
    base: String,
    counter: usize,
    entries: Vec<(String, String, String)>,
    declarations: String,
}

impl SubParserTable {
    fn new(base: &str) -> Self {
        Self { base: base.to_string(), counter: 0, entries: Vec::new(), declarations: String::new() }
    }

    fn declare(&mut self, label: &str, program: &[u8], recipe_expr: &str) -> (String, String) {
        self.counter += 1;
        let program_const = format!("DER_SUBPROG_{}_{}", self.base, self.counter);
        let recipe_const = format!("DER_SUBRCP_{}_{}", self.base, self.counter);
        self.declarations.push_str(&format!(
            "static {program_const}: &[u8] = &{};\nstatic {recipe_const}: asnpack::recipe::Recipe = {recipe_expr};\n"
        ));
        self.entries.push((label.to_string(), program_const.clone(), recipe_const.clone()));
        (program_const, recipe_const)
    }

    fn table_entries(&self) -> String {
        self.entries
            .iter()
            .map(|(name, program, recipe)| {
                format!("asnpack::recipe::SubParser {{ name: {name:?}, program: {program}, recipe: &{recipe} }}")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Renders one [`RecipeIr`] node as Rust source for an `asnpack::recipe::Recipe`
/// value.
///
/// A [`RecipeIr::TypeRef`] targeting the very type currently being rendered
/// (the ordinary shape of a self-referential ASN.1 type, e.g.
/// `A ::= SEQUENCE { next A OPTIONAL }`) renders as `&DER_OVLY_<self>` inside
/// that same static's own initializer. This is not a forbidden cycle: taking
/// a reference to a `static` only needs its address, which is known before
/// its value is computed, so rustc resolves it without having to evaluate
/// `DER_OVLY_<self>` in order to evaluate `DER_OVLY_<self>` (DESIGN.md).
fn render_recipe(module: &str, recipe: &RecipeIr, sub: &mut SubParserTable) -> String {
    match recipe {
        RecipeIr::Leaf(slot) => format!("asnpack::recipe::Recipe::Leaf({slot})"),
        RecipeIr::Named(fields) => {
            let items = fields
                .iter()
                .map(|(name, field)| format!("({name:?}, {})", render_recipe(module, field, sub)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("asnpack::recipe::Recipe::Named(&[{items}])")
        }
        RecipeIr::Repeated { slot, element_program, element_recipe } => {
            let element_expr = render_recipe(module, element_recipe, sub);
            let (program_const, recipe_const) = sub.declare("element", element_program, &element_expr);
            format!(
                "asnpack::recipe::Recipe::Repeated {{ slot: {slot}, element_program: {program_const}, element_recipe: &{recipe_const} }}"
            )
        }
        RecipeIr::TypeRef { slot, module: target_module, name } => {
            let pack = pack_const_name(target_module, name);
            let ovly = ovly_const_name(target_module, name);
            let path_prefix = if target_module == module { String::new() } else { format!("super::{}::", target_module.to_snake_case()) };
            format!("asnpack::recipe::Recipe::TypeRef {{ slot: {slot}, program: {path_prefix}{pack}, recipe: &{path_prefix}{ovly} }}")
        }
    }
}

fn render_bytes(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| format!("0x{b:02x}")).collect();
    format!("[{}]", items.join(", "))
}

/// Generates a typed accessor struct over a [`RecipeIr::Named`] type's
/// fields Types that compile to
/// something other than `Named` at the top level (a bare leaf, `SEQUENCE
/// OF`, or a type-reference assignment) get no struct — callers navigate
/// those through `asnpack::recipe::View`/`Field` directly.
///
/// A nested `SEQUENCE`/`SET`/`CHOICE` field is exposed as a plain
/// `asnpack::recipe::View` rather than its own uniquely-named struct: doing
/// better would need a second, name-assigning pass over anonymous nested
/// component lists, which this back-end does not perform (DESIGN.md).
fn generate_view_struct(struct_name: &str, ovly_const: &str, recipe: &RecipeIr) -> String {
    let RecipeIr::Named(fields) = recipe else { return String::new() };

    let mut out = format!(
        "/// Typed accessor view over one decoded `{struct_name}` value.\n\
         #[derive(Debug, Clone, Copy)]\n\
         pub struct {struct_name}<'c> {{\n    view: asnpack::recipe::View<'c>,\n}}\n\n\
         impl<'c> {struct_name}<'c> {{\n\
         \u{20}\u{20}\u{20}\u{20}/// Constructs a view over a cursor array unpacked against `{ovly_const}`'s program.\n\
         \u{20}\u{20}\u{20}\u{20}pub fn new(cursors: &'c asnpack::CursorArray, input: &'c [u8]) -> Self {{\n\
         \u{20}\u{20}\u{20}\u{20}\u{20}\u{20}\u{20}\u{20}Self {{ view: asnpack::recipe::View::new(cursors, input, &{ovly_const}) }}\n\
         \u{20}\u{20}\u{20}\u{20}}}\n\n"
    );

    for (name, field_recipe) in fields {
        let accessor = name.to_snake_case();
        match field_recipe {
            RecipeIr::Leaf(_) => out.push_str(&format!(
                "    pub fn {accessor}(&self) -> Option<&'c [u8]> {{\n        self.view.field({name:?})?.as_leaf()\n    }}\n\n"
            )),
            RecipeIr::Named(_) => out.push_str(&format!(
                "    pub fn {accessor}(&self) -> Option<asnpack::recipe::View<'c>> {{\n        self.view.field({name:?})?.as_nested()\n    }}\n\n"
            )),
            RecipeIr::Repeated { .. } => out.push_str(&format!(
                "    pub fn {accessor}(&self) -> Result<alloc::vec::Vec<asnpack::recipe::Element<'c>>, asnpack::DecodeError> {{\n        Ok(self.view.field({name:?}).map(|f| f.elements()).transpose()?.unwrap_or_default())\n    }}\n\n"
            )),
            RecipeIr::TypeRef { .. } => out.push_str(&format!(
                "    pub fn {accessor}(&self) -> Result<Option<asnpack::recipe::Element<'c>>, asnpack::DecodeError> {{\n        self.view.field({name:?}).map(|f| f.resolve()).transpose().map(Option::flatten)\n    }}\n\n"
            )),
        }
    }

    out.push_str("}\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_module;
    use crate::parser::parse_module;
    use crate::tree::ModuleSet;

    fn compile_first(source: &str) -> CompiledType {
        let module = parse_module(source).unwrap();
        let name = module.name.clone();
        let mut modules = ModuleSet::new();
        modules.insert(name.clone(), module);
        compile_module(&modules, &name).unwrap().remove(0)
    }

    #[test]
    fn generates_expected_const_and_struct_names() {
        let compiled = compile_first(
            "Certs DEFINITIONS ::= BEGIN\nTbsCert ::= SEQUENCE { serial INTEGER, subject OCTET STRING OPTIONAL }\nEND\n",
        );
        let out = generate_module("Certs", std::slice::from_ref(&compiled));
        assert!(out.contains("pub const DER_PACK_CERTS_TBS_CERT: &[u8]"));
        assert!(out.contains("pub fn der_pimp_certs_tbs_cert(implicit_tag: u8)"));
        assert!(out.contains("pub use der_pimp_certs_tbs_cert as DER_PIMP_CERTS_TBS_CERT;"));
        assert!(out.contains("pub static DER_OVLY_CERTS_TBS_CERT: asnpack::recipe::Recipe"));
        assert!(out.contains("pub struct CertsTbsCert<'c>"));
        assert!(out.contains("pub fn serial(&self) -> Option<&'c [u8]>"));
        assert!(out.contains("pub fn subject(&self) -> Option<&'c [u8]>"));
    }

    #[test]
    fn sequence_of_field_gets_a_result_vec_accessor() {
        let compiled = compile_first(
            "Certs DEFINITIONS ::= BEGIN\nBag ::= SEQUENCE { items INTEGER }\nHolder ::= SEQUENCE { bags SEQUENCE OF Bag }\nEND\n",
        );
        let out = generate_module("Certs", &[compiled]);
        assert!(out.contains("Result<alloc::vec::Vec<asnpack::recipe::Element<'c>>, asnpack::DecodeError>"));
        assert!(out.contains("DER_SUBPROG_CERTS_HOLDER_1"));
        assert!(out.contains("DER_SUBRCP_CERTS_HOLDER_1"));
    }

    #[test]
    fn self_referential_type_renders_a_self_referencing_static() {
        let compiled = compile_first("M DEFINITIONS ::= BEGIN\nA ::= SEQUENCE { next A OPTIONAL }\nEND\n");
        let out = generate_module("M", &[compiled]);
        assert!(out.contains("recipe: &DER_OVLY_M_A"));
        assert!(out.contains("program: DER_PACK_M_A"));
    }

    #[test]
    fn leaf_type_gets_no_view_struct() {
        let compiled = compile_first("M DEFINITIONS ::= BEGIN\nMyInt ::= INTEGER\nEND\n");
        let out = generate_module("M", &[compiled]);
        assert!(!out.contains("pub struct"));
        assert!(out.contains("pub const DER_PACK_M_MY_INT"));
    }
}
