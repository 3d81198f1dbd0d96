//! Projection building
//!
//! Lowers anonymous-type, tuple and list construction into select lists.
//! Fields are rewritten independently, but a single failing field makes the
//! whole projection unsupported.

use crate::query::QueryNode;
use crate::rewrite::Rewriter;
use indexmap::IndexMap;
use restq_expr::{Expression, ListInitExpr, NewExpr};

/// Build a named-field projection from a record construction
pub fn build_projection(rewriter: &Rewriter<'_>, new: &NewExpr, source: &Expression, depth: usize) -> QueryNode {
    let names = field_names(rewriter, new);
    let mut fields = IndexMap::with_capacity(new.args.len());
    let mut failed = false;

    for (name, arg) in names.into_iter().zip(&new.args) {
        let node = rewriter.rewrite_at(arg, depth);
        failed |= node.is_unsupported();
        fields.insert(name, node);
    }

    if failed {
        return QueryNode::propagated(source, fields.into_values().collect());
    }
    QueryNode::projection(fields, new.ty.clone())
}

/// Build a positional list from a collection literal
pub fn build_list(rewriter: &Rewriter<'_>, list: &ListInitExpr, source: &Expression, depth: usize) -> QueryNode {
    let elements: Vec<QueryNode> = list
        .elements
        .iter()
        .map(|element| rewriter.rewrite_at(element, depth))
        .collect();

    if elements.iter().any(QueryNode::is_unsupported) {
        return QueryNode::propagated(source, elements);
    }
    QueryNode::list(elements, list.ty.clone())
}

/// Field names in argument order: recorded member names, then constructor
/// parameter names from metadata, then positional `Item{N}`
fn field_names(rewriter: &Rewriter<'_>, new: &NewExpr) -> Vec<String> {
    let arity = new.args.len();
    if let Some(members) = new.members.as_ref().filter(|m| m.len() == arity) {
        return members.clone();
    }

    let constructor = rewriter
        .classifier()
        .cache()
        .type_metadata(&new.ty)
        .and_then(|meta| meta.constructor.clone())
        .filter(|params| params.len() == arity);
    if let Some(params) = constructor {
        return params;
    }

    (1..=arity).map(|i| format!("Item{}", i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryKind;
    use crate::{CompilerOptions, RootMode};
    use pretty_assertions::assert_eq;
    use restq_expr::{HostType, Lambda, Parameter};
    use restq_types::{ConventionMapping, MappingRegistry, MetadataCache, TypeKind, TypeMetadata};
    use std::sync::Arc;

    fn x() -> Parameter {
        Parameter::new("x", HostType::named("TestResource"))
    }

    fn project(cache: &MetadataCache, body: Expression) -> QueryNode {
        let options = CompilerOptions::default();
        let lambda = Lambda::new(x(), body);
        Rewriter::new(cache, &options, &lambda, RootMode::Selector)
            .unwrap()
            .rewrite()
    }

    fn names(node: &QueryNode) -> Vec<String> {
        match node.kind() {
            QueryKind::Projection(fields) => fields.keys().cloned().collect(),
            other => panic!("Expected projection, got {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_keeps_declaration_order() {
        let cache = MetadataCache::new(Arc::new(ConventionMapping::default()));
        let body = Expression::new_anonymous(
            "<>f__AnonymousType0",
            [
                ("B", x().to_expr().member("Bar", HostType::String)),
                ("A", x().to_expr().member("Foo", HostType::String)),
            ],
        );
        assert_eq!(names(&project(&cache, body)), vec!["B", "A"]);
    }

    #[test]
    fn test_tuple_gets_positional_names() {
        let cache = MetadataCache::new(Arc::new(ConventionMapping::default()));
        let body = Expression::new_tuple(vec![
            x().to_expr().member("Foo", HostType::String),
            x().to_expr().member("Number", HostType::Int32),
        ]);
        assert_eq!(names(&project(&cache, body)), vec!["Item1", "Item2"]);
    }

    #[test]
    fn test_constructor_names_from_metadata() {
        let registry = MappingRegistry::new().with_type(
            TypeMetadata::new("Pair", TypeKind::Anonymous).with_constructor(["Left", "Right"]),
        );
        let cache = MetadataCache::new(Arc::new(registry));
        let body = Expression::new_object(
            HostType::anonymous("Pair"),
            vec![
                x().to_expr().member("Foo", HostType::String),
                x().to_expr().member("Bar", HostType::String),
            ],
        );
        assert_eq!(names(&project(&cache, body)), vec!["Left", "Right"]);
    }

    #[test]
    fn test_one_bad_field_fails_whole_projection() {
        let cache = MetadataCache::new(Arc::new(ConventionMapping::default()));
        let body = Expression::new_anonymous(
            "<>f__AnonymousType1",
            [
                ("A", x().to_expr().member("Foo", HostType::String)),
                (
                    "B",
                    x().to_expr()
                        .member("Bar", HostType::String)
                        .call("Frobnicate", vec![], HostType::String),
                ),
            ],
        );
        let node = project(&cache, body);
        let marker = node.as_unsupported().unwrap();
        assert_eq!(marker.nested().len(), 2);
        assert!(!marker.nested()[0].is_unsupported());
    }

    #[test]
    fn test_list_root() {
        let cache = MetadataCache::new(Arc::new(ConventionMapping::default()));
        let body = Expression::list(
            HostType::String,
            vec![
                x().to_expr().member("Foo", HostType::String),
                Expression::constant("lit"),
            ],
        );
        let node = project(&cache, body);
        assert!(matches!(node.kind(), QueryKind::List(items) if items.len() == 2));
    }
}
