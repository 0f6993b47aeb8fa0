//! Assignability checks on annotated literal initializers.
//!
//! Covers `let x: T = <literal>` and `class C { x: T = <literal> }` where
//! `T` is a keyword type or a union of keyword types. Anything involving a
//! type reference is skipped.

use super::codes;
use super::parse::ParsedModule;
use crate::diagnostics::{Diagnostic, SourceFile};
use std::sync::Arc;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    ClassProp, Expr, Lit, Pat, TsKeywordTypeKind, TsType, TsTypeAnn,
    TsUnionOrIntersectionType, UnaryOp, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Type of a literal initializer, named as TypeScript prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralType {
    String,
    Number,
    Boolean,
    BigInt,
    Null,
    Undefined,
}

impl LiteralType {
    fn of(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Lit(Lit::Str(_)) => Some(Self::String),
            Expr::Lit(Lit::Num(_)) => Some(Self::Number),
            Expr::Lit(Lit::Bool(_)) => Some(Self::Boolean),
            Expr::Lit(Lit::BigInt(_)) => Some(Self::BigInt),
            Expr::Lit(Lit::Null(_)) => Some(Self::Null),
            Expr::Tpl(tpl) if tpl.exprs.is_empty() => Some(Self::String),
            Expr::Ident(ident) if &*ident.sym == "undefined" => Some(Self::Undefined),
            Expr::Unary(unary) if matches!(unary.op, UnaryOp::Minus | UnaryOp::Plus) => {
                match Self::of(&unary.arg)? {
                    Self::Number => Some(Self::Number),
                    Self::BigInt if unary.op == UnaryOp::Minus => Some(Self::BigInt),
                    _ => None,
                }
            }
            Expr::Paren(paren) => Self::of(&paren.expr),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Null => "null",
            Self::Undefined => "undefined",
        }
    }
}

/// An annotation this checker understands.
enum Target {
    Keyword(TsKeywordTypeKind),
    Union(Vec<TsKeywordTypeKind>),
}

impl Target {
    fn of(ty: &TsType) -> Option<Self> {
        match ty {
            TsType::TsKeywordType(keyword) => Some(Self::Keyword(keyword.kind)),
            TsType::TsParenthesizedType(paren) => Self::of(&paren.type_ann),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let mut kinds = Vec::with_capacity(union.types.len());
                for member in &union.types {
                    match Self::of(member)? {
                        Self::Keyword(kind) => kinds.push(kind),
                        Self::Union(nested) => kinds.extend(nested),
                    }
                }
                Some(Self::Union(kinds))
            }
            _ => None,
        }
    }

    fn accepts(&self, literal: LiteralType, strict_null_checks: bool) -> bool {
        match self {
            Self::Keyword(kind) => keyword_accepts(*kind, literal, strict_null_checks),
            Self::Union(kinds) => kinds
                .iter()
                .any(|kind| keyword_accepts(*kind, literal, strict_null_checks)),
        }
    }
}

fn keyword_accepts(kind: TsKeywordTypeKind, literal: LiteralType, strict_null_checks: bool) -> bool {
    use TsKeywordTypeKind as K;

    match kind {
        K::TsAnyKeyword | K::TsUnknownKeyword | K::TsIntrinsicKeyword => return true,
        _ => {}
    }
    if !strict_null_checks && matches!(literal, LiteralType::Null | LiteralType::Undefined) {
        return true;
    }
    match literal {
        LiteralType::String => kind == K::TsStringKeyword,
        LiteralType::Number => kind == K::TsNumberKeyword,
        LiteralType::Boolean => kind == K::TsBooleanKeyword,
        LiteralType::BigInt => kind == K::TsBigIntKeyword,
        LiteralType::Null => kind == K::TsNullKeyword,
        LiteralType::Undefined => matches!(kind, K::TsUndefinedKeyword | K::TsVoidKeyword),
    }
}

struct AssignabilityChecker<'a> {
    file: &'a Arc<SourceFile>,
    parsed: &'a ParsedModule,
    strict_null_checks: bool,
    diagnostics: Vec<Diagnostic>,
}

impl AssignabilityChecker<'_> {
    fn check(&mut self, name_span: Span, annotation: Option<&TsTypeAnn>, init: Option<&Expr>) {
        let (Some(annotation), Some(init)) = (annotation, init) else {
            return;
        };
        let Some(literal) = LiteralType::of(init) else {
            return;
        };
        let Some(target) = Target::of(&annotation.type_ann) else {
            return;
        };
        if target.accepts(literal, self.strict_null_checks) {
            return;
        }

        let (type_start, type_length) = self.parsed.range(annotation.type_ann.span());
        let target_text = self
            .file
            .text()
            .get(type_start..type_start + type_length)
            .unwrap_or("unknown")
            .trim();
        let (start, length) = self.parsed.range(name_span);
        self.diagnostics.push(
            Diagnostic::error(
                codes::NOT_ASSIGNABLE,
                format!(
                    "Type '{}' is not assignable to type '{target_text}'.",
                    literal.as_str()
                ),
            )
            .with_span(Arc::clone(self.file), start, length),
        );
    }
}

impl Visit for AssignabilityChecker<'_> {
    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        if let Pat::Ident(binding) = &declarator.name {
            self.check(
                binding.id.span,
                binding.type_ann.as_deref(),
                declarator.init.as_deref(),
            );
        }
        declarator.visit_children_with(self);
    }

    fn visit_class_prop(&mut self, prop: &ClassProp) {
        if !prop.declare {
            self.check(prop.key.span(), prop.type_ann.as_deref(), prop.value.as_deref());
        }
        prop.visit_children_with(self);
    }
}

/// Run the assignability checks over a parsed module.
pub(crate) fn check_module(
    file: &Arc<SourceFile>,
    parsed: &ParsedModule,
    strict_null_checks: bool,
) -> Vec<Diagnostic> {
    let Some(module) = &parsed.module else {
        return Vec::new();
    };
    let mut checker = AssignabilityChecker {
        file,
        parsed,
        strict_null_checks,
        diagnostics: Vec::new(),
    };
    module.visit_with(&mut checker);
    checker.diagnostics
}
