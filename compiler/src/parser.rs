//! The ASN.1 notation front end: turns `.asn1` module source into the
//! [`crate::tree`] semantic tree, via a [`pest`](https://pest.rs) grammar
//! (`grammar.pest`).

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::tree::{
    ChoiceType, ComponentType, DefinedType, Import, Module, NamedType, SequenceOfType,
    SequenceType, SetType, SimpleType, Tag, TagClass, TagKind, TaggedType, Type, TypeAssignment,
};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct Asn1Parser;

/// Parses one module's source text.
///
/// Returns the raw `pest` error rather than [`crate::error::CompileError`]
/// so that callers (the linker, in practice) can attach the source file
/// path the error lacks context for on its own.
pub fn parse_module(source: &str) -> Result<Module, Box<pest::error::Error<Rule>>> {
    let mut pairs = Asn1Parser::parse(Rule::module, source).map_err(Box::new)?;
    let module_pair = pairs.next().expect("module rule always produces one pair");
    Ok(module(module_pair))
}

fn module(pair: Pair<Rule>) -> Module {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let mut imports = Vec::new();
    let mut assignments = Vec::new();
    for item in inner {
        match item.as_rule() {
            Rule::import_list => imports.extend(import_list(item)),
            Rule::assignment => assignments.push(type_assignment(item.into_inner().next().unwrap())),
            Rule::EOI => {}
            _ => unreachable!("unexpected module item {:?}", item.as_rule()),
        }
    }
    Module { name, imports, assignments }
}

fn import_list(pair: Pair<Rule>) -> Vec<Import> {
    pair.into_inner().map(import_from).collect()
}

fn import_from(pair: Pair<Rule>) -> Import {
    let mut inner = pair.into_inner();
    let symbols = inner
        .next()
        .unwrap()
        .into_inner()
        .map(|id| id.as_str().to_string())
        .collect();
    let from_module = inner.next().unwrap().as_str().to_string();
    Import { symbols, from_module }
}

fn type_assignment(pair: Pair<Rule>) -> TypeAssignment {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let ty = parse_type(inner.next().unwrap());
    TypeAssignment { name, ty }
}

fn parse_type(pair: Pair<Rule>) -> Type {
    debug_assert_eq!(pair.as_rule(), Rule::type_rule);
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::tagged_type => Type::Tagged(Box::new(tagged_type(inner))),
        Rule::sequence_of_type => Type::SequenceOf(Box::new(sequence_of_type(inner))),
        Rule::set_of_type => Type::SetOf(Box::new(sequence_of_type(inner))),
        Rule::sequence_type => Type::Sequence(sequence_type(inner)),
        Rule::set_type => Type::Set(set_type(inner)),
        Rule::choice_type => Type::Choice(choice_type(inner)),
        Rule::simple_type => Type::Simple(simple_type(inner)),
        Rule::defined_type => Type::Defined(defined_type(inner)),
        other => unreachable!("unexpected type alternative {other:?}"),
    }
}

fn tagged_type(pair: Pair<Rule>) -> TaggedType {
    let mut inner = pair.into_inner();
    let tag_pair = inner.next().unwrap();
    let mut tag_inner = tag_pair.into_inner();
    let (class, number) = match tag_inner.next() {
        Some(first) if first.as_rule() == Rule::tag_class => {
            let class = match first.as_str() {
                "UNIVERSAL" => TagClass::Universal,
                "APPLICATION" => TagClass::Application,
                "PRIVATE" => TagClass::Private,
                other => unreachable!("unexpected tag class {other}"),
            };
            let number = tag_inner.next().unwrap().as_str().parse().expect("number rule is digits");
            (class, number)
        }
        Some(number_pair) => {
            let number = number_pair.as_str().parse().expect("number rule is digits");
            (TagClass::Context, number)
        }
        None => unreachable!("tag always has a number"),
    };
    let mut kind = TagKind::Explicit;
    let mut next = inner.next().unwrap();
    if next.as_rule() == Rule::tag_kind {
        kind = match next.as_str() {
            "IMPLICIT" => TagKind::Implicit,
            "EXPLICIT" => TagKind::Explicit,
            other => unreachable!("unexpected tag kind {other}"),
        };
        next = inner.next().unwrap();
    }
    TaggedType { tag: Tag { class, number, kind }, underlying: parse_type(next) }
}

fn sequence_of_type(pair: Pair<Rule>) -> SequenceOfType {
    let element = parse_type(pair.into_inner().next().unwrap());
    SequenceOfType { element }
}

fn sequence_type(pair: Pair<Rule>) -> SequenceType {
    SequenceType { components: component_list(pair) }
}

fn set_type(pair: Pair<Rule>) -> SetType {
    SetType { components: component_list(pair) }
}

fn component_list(pair: Pair<Rule>) -> Vec<ComponentType> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::component_list)
        .flat_map(|list| list.into_inner().map(component))
        .collect()
}

fn component(pair: Pair<Rule>) -> ComponentType {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::extension_marker => ComponentType::ExtensionMarker,
        Rule::named_type => ComponentType::Named(named_type(inner)),
        other => unreachable!("unexpected component {other:?}"),
    }
}

fn choice_type(pair: Pair<Rule>) -> ChoiceType {
    let alternatives = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::alternative_list)
        .into_iter()
        .flat_map(|list| list.into_inner().map(named_type))
        .collect();
    ChoiceType { alternatives }
}

fn named_type(pair: Pair<Rule>) -> NamedType {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let ty = parse_type(inner.next().unwrap());
    // Both `optional_marker` and `default_marker` mean the field may be
    // physically absent from the encoding.
    let optional = inner.next().is_some();
    NamedType { name, ty, optional }
}

fn simple_type(pair: Pair<Rule>) -> SimpleType {
    match pair.as_str() {
        "ANY" => SimpleType::Any,
        "BOOLEAN" => SimpleType::Boolean,
        "INTEGER" => SimpleType::Integer,
        "REAL" => SimpleType::Real,
        "ENUMERATED" => SimpleType::Enumerated,
        "NULL" => SimpleType::Null,
        "UTF8String" => SimpleType::Utf8String,
        "PrintableString" => SimpleType::PrintableString,
        "IA5String" => SimpleType::Ia5String,
        "NumericString" => SimpleType::NumericString,
        "TeletexString" => SimpleType::TeletexString,
        "VideotexString" => SimpleType::VideotexString,
        "GraphicString" => SimpleType::GraphicString,
        "VisibleString" => SimpleType::VisibleString,
        "GeneralString" => SimpleType::GeneralString,
        "UniversalString" => SimpleType::UniversalString,
        "BMPString" => SimpleType::BmpString,
        "UTCTime" => SimpleType::UtcTime,
        "GeneralizedTime" => SimpleType::GeneralizedTime,
        text if text.split_whitespace().eq(["BIT", "STRING"]) => SimpleType::BitString,
        text if text.split_whitespace().eq(["OCTET", "STRING"]) => SimpleType::OctetString,
        text if text.split_whitespace().eq(["OBJECT", "IDENTIFIER"]) => SimpleType::ObjectIdentifier,
        "RELATIVE-OID" => SimpleType::RelativeOid,
        other => unreachable!("unexpected builtin type text {other:?}"),
    }
}

fn defined_type(pair: Pair<Rule>) -> DefinedType {
    let mut idents: Vec<&str> = pair.into_inner().map(|p| p.as_str()).collect();
    let name = idents.pop().unwrap().to_string();
    let module = idents.pop().map(str::to_string);
    DefinedType { module, name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_simple_module() {
        let source = r#"
            Greeting DEFINITIONS ::= BEGIN
                Message ::= SEQUENCE {
                    text UTF8String,
                    urgent BOOLEAN OPTIONAL
                }
            END
        "#;
        let module = parse_module(source).unwrap();
        assert_eq!(module.name, "Greeting");
        assert_eq!(module.assignments.len(), 1);
        let Type::Sequence(seq) = &module.assignments[0].ty else { panic!("expected SEQUENCE") };
        assert_eq!(seq.components.len(), 2);
    }

    #[test]
    fn parses_tagged_choice_and_sequence_of() {
        let source = r#"
            Shapes DEFINITIONS ::= BEGIN
                Shape ::= CHOICE {
                    circle [0] IMPLICIT INTEGER,
                    square [1] IMPLICIT INTEGER
                }
                ShapeList ::= SEQUENCE OF Shape
            END
        "#;
        let module = parse_module(source).unwrap();
        assert_eq!(module.assignments.len(), 2);
        assert!(matches!(module.assignments[0].ty, Type::Choice(_)));
        assert!(matches!(module.assignments[1].ty, Type::SequenceOf(_)));
    }

    #[test]
    fn parses_imports_and_defined_types() {
        let source = r#"
            Client DEFINITIONS ::= BEGIN
                IMPORTS Shape FROM Shapes;
                Holder ::= SEQUENCE { held Shapes.Shape }
            END
        "#;
        let module = parse_module(source).unwrap();
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].symbols, vec!["Shape".to_string()]);
        assert_eq!(module.imports[0].from_module, "Shapes");
    }

    #[test]
    fn rejects_malformed_source() {
        assert!(parse_module("not asn1 at all").is_err());
    }

    #[test]
    fn parses_any_and_default() {
        let source = r#"
            Holder DEFINITIONS ::= BEGIN
                Info ::= SEQUENCE {
                    payload ANY,
                    version INTEGER DEFAULT 1
                }
            END
        "#;
        let module = parse_module(source).unwrap();
        let Type::Sequence(seq) = &module.assignments[0].ty else { panic!("expected SEQUENCE") };
        let ComponentType::Named(payload) = &seq.components[0] else { panic!() };
        assert!(matches!(payload.ty, Type::Simple(SimpleType::Any)));
        assert!(!payload.optional);
        let ComponentType::Named(version) = &seq.components[1] else { panic!() };
        assert!(version.optional);
    }
}
