//! AST for the Witness contract language.
//!
//! The upstream parser delivers a [`Program`] in exactly this shape; the
//! analyzer never mutates it. Statements own their expressions, and the
//! whole tree is plain data so downstream layers can hold borrows into it
//! for the duration of an analysis.

/// Top-level program = ordered statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

/// A single top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Type(TypeDefinition),
    Asset(AssetDefinition),
    Clause(ClauseDefinition),
    /// A bare directive call statement, e.g. `global();` or `litis(a, b);`.
    Directive(FunctionCall),
    /// A stray semicolon.
    Empty,
}

/// Keyword of a primitive type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKeyword {
    Object,
    Service,
    Action,
    Subject,
    Authority,
    Time,
}

impl TypeKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKeyword::Object => "object",
            TypeKeyword::Service => "service",
            TypeKeyword::Action => "action",
            TypeKeyword::Subject => "subject",
            TypeKeyword::Authority => "authority",
            TypeKeyword::Time => "time",
        }
    }
}

impl std::fmt::Display for TypeKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `object gold = movable;` and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub keyword: TypeKeyword,
    pub name: String,
    /// Constraint tag and, for actions, `[description, referenced_type]`.
    pub properties: Vec<Expression>,
}

/// `asset k = alice, "give", bob;` or `asset k = transfer(a, b);`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDefinition {
    pub name: String,
    /// Either three components or a single join/meet call.
    pub value: Vec<Expression>,
}

/// `clause c1 = oblig(k);`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseDefinition {
    pub name: String,
    pub expression: Expression,
}

/// Binary boolean connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Implies,
    Equiv,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Implies => "IMPLIES",
            BinaryOp::Equiv => "EQUIV",
        };
        f.write_str(s)
    }
}

/// Unary boolean connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

/// A call such as `oblig(k)`, `transfer(a, b)` or `global()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The single identifier argument, if the call has exactly one and it
    /// is an identifier.
    pub fn sole_identifier(&self) -> Option<&str> {
        match self.args.as_slice() {
            [Expression::Identifier(name)] => Some(name),
            _ => None,
        }
    }
}

/// Expression sum type.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    StringLiteral(String),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Call(FunctionCall),
}

impl Expression {
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::StringLiteral(value.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call(FunctionCall::new(name, args))
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expression) -> Self {
        Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&FunctionCall> {
        match self {
            Expression::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Visit every identifier in the expression, depth-first.
    pub fn for_each_identifier(&self, f: &mut impl FnMut(&str)) {
        match self {
            Expression::Identifier(name) => f(name),
            Expression::StringLiteral(_) => {}
            Expression::Binary { left, right, .. } => {
                left.for_each_identifier(f);
                right.for_each_identifier(f);
            }
            Expression::Unary { operand, .. } => operand.for_each_identifier(f),
            Expression::Call(call) => {
                for arg in &call.args {
                    arg.for_each_identifier(f);
                }
            }
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{name}"),
            Expression::StringLiteral(value) => write!(f, "\"{value}\""),
            Expression::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expression::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "NOT {operand}"),
            Expression::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_source_like_text() {
        let expr = Expression::binary(
            BinaryOp::Implies,
            Expression::call("oblig", vec![Expression::ident("p")]),
            Expression::call("claim", vec![Expression::ident("q")]),
        );
        assert_eq!(expr.to_string(), "(oblig(p) IMPLIES claim(q))");

        let neg = Expression::not(Expression::ident("k"));
        assert_eq!(neg.to_string(), "NOT k");

        let lit = Expression::string("give");
        assert_eq!(lit.to_string(), "\"give\"");
    }

    #[test]
    fn for_each_identifier_walks_nested_calls() {
        let expr = Expression::binary(
            BinaryOp::And,
            Expression::call("oblig", vec![Expression::ident("a")]),
            Expression::not(Expression::call("claim", vec![Expression::ident("b")])),
        );
        let mut seen = Vec::new();
        expr.for_each_identifier(&mut |name| seen.push(name.to_string()));
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn sole_identifier_rejects_compound_arguments() {
        let simple = FunctionCall::new("oblig", vec![Expression::ident("k")]);
        assert_eq!(simple.sole_identifier(), Some("k"));

        let compound = FunctionCall::new(
            "oblig",
            vec![Expression::call("claim", vec![Expression::ident("k")])],
        );
        assert_eq!(compound.sole_identifier(), None);

        let binary_arity = FunctionCall::new(
            "oblig",
            vec![Expression::ident("a"), Expression::ident("b")],
        );
        assert_eq!(binary_arity.sole_identifier(), None);
    }
}
