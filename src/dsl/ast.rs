//! AST types for EEQL queries.
//!
//! Every node carries the span it was parsed from. Nodes are plain values;
//! position lookups walk down from the root (see [`Query::nodes`]).

use crate::dsl::span::{Position, Span, Spanned};

// ============================================================================
// Top level
// ============================================================================

/// A parsed query: one base selection plus any number of joins.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub select: SelectClause,
    pub joins: Vec<JoinClause>,
    pub span: Span,
}

/// `select <selector>? <event> ( <columns> )`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectClause {
    pub event_name: Spanned<String>,
    pub selector: Selector,
    pub columns: Vec<ColumnExpr>,
    pub span: Span,
}

/// `join <qualifier> <selector>? <event> ( using ... <columns> filter(...)? )`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub qualifier: Spanned<JoinQualifier>,
    pub event_name: Spanned<String>,
    pub selector: Selector,
    /// Entity names from the `using` list, possibly empty.
    pub using_entities: Vec<Spanned<String>>,
    pub columns: Vec<ColumnExpr>,
    pub filter: Option<FilterExpr>,
    pub span: Span,
}

impl JoinClause {
    pub fn using_names(&self) -> Vec<&str> {
        self.using_entities.iter().map(|e| e.value.as_str()).collect()
    }
}

// ============================================================================
// Selectors and qualifiers
// ============================================================================

/// Which row per entity a clause takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    First,
    Last,
    /// No selector written; the span is zero-width at the event name.
    Omitted,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::First => "first",
            SelectorKind::Last => "last",
            SelectorKind::Omitted => "omitted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selector {
    pub kind: SelectorKind,
    pub span: Span,
}

impl Selector {
    pub fn is_omitted(&self) -> bool {
        self.kind == SelectorKind::Omitted
    }
}

/// Temporal relation of a joined event to the base event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinQualifier {
    Before,
    After,
}

impl JoinQualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinQualifier::Before => "before",
            JoinQualifier::After => "after",
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Aggregation functions usable in a column expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    FirstValue,
    LastValue,
}

impl AggregateFunction {
    /// All functions, in the order completion offers them.
    pub const ALL: [AggregateFunction; 8] = [
        AggregateFunction::Count,
        AggregateFunction::CountDistinct,
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::FirstValue,
        AggregateFunction::LastValue,
    ];

    /// Parse a function name (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunction::Count),
            "count_distinct" => Some(AggregateFunction::CountDistinct),
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            "first_value" => Some(AggregateFunction::FirstValue),
            "last_value" => Some(AggregateFunction::LastValue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::CountDistinct => "count_distinct",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::FirstValue => "first_value",
            AggregateFunction::LastValue => "last_value",
        }
    }

    /// One-line description for hover and completion details.
    pub fn description(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "number of matching rows with a non-null value",
            AggregateFunction::CountDistinct => "number of distinct non-null values",
            AggregateFunction::Sum => "sum of the values",
            AggregateFunction::Avg => "average of the values",
            AggregateFunction::Min => "smallest value",
            AggregateFunction::Max => "largest value",
            AggregateFunction::FirstValue => "value on the earliest matching row",
            AggregateFunction::LastValue => "value on the latest matching row",
        }
    }

    /// Whether the result is a count (zero rather than NULL when nothing matched).
    pub fn is_count(&self) -> bool {
        matches!(self, AggregateFunction::Count | AggregateFunction::CountDistinct)
    }

    /// Whether the function picks a row by timestamp rather than folding values.
    pub fn is_positional(&self) -> bool {
        matches!(self, AggregateFunction::FirstValue | AggregateFunction::LastValue)
    }
}

/// One output column of a clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpr {
    /// `source as alias`
    Reference {
        source_column: Spanned<String>,
        alias: Spanned<String>,
        span: Span,
    },
    /// `function(argument) as alias`
    Aggregation {
        function: Spanned<AggregateFunction>,
        argument_column: Spanned<String>,
        alias: Spanned<String>,
        span: Span,
    },
}

impl ColumnExpr {
    pub fn alias(&self) -> &Spanned<String> {
        match self {
            ColumnExpr::Reference { alias, .. } | ColumnExpr::Aggregation { alias, .. } => alias,
        }
    }

    /// The event column this expression reads.
    pub fn input_column(&self) -> &Spanned<String> {
        match self {
            ColumnExpr::Reference { source_column, .. } => source_column,
            ColumnExpr::Aggregation {
                argument_column, ..
            } => argument_column,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ColumnExpr::Reference { span, .. } | ColumnExpr::Aggregation { span, .. } => *span,
        }
    }

    pub fn is_aggregation(&self) -> bool {
        matches!(self, ColumnExpr::Aggregation { .. })
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Comparison operators allowed in a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// Literal value on the right of a filter comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}", x),
        }
    }
}

/// `filter(column op literal)`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub column: Spanned<String>,
    pub operator: Spanned<CompareOp>,
    pub literal: Spanned<Literal>,
    pub span: Span,
}

// ============================================================================
// Position lookup
// ============================================================================

/// Which clause a node belongs to: `None` for the base select, `Some(i)`
/// for the i-th join.
pub type ClauseIndex = Option<usize>;

/// A reference to one spanned piece of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Query(&'a Query),
    Select(&'a SelectClause),
    Join(usize, &'a JoinClause),
    EventName(ClauseIndex, &'a Spanned<String>),
    Selector(ClauseIndex, &'a Selector),
    Qualifier(usize, &'a Spanned<JoinQualifier>),
    UsingEntity(usize, &'a Spanned<String>),
    Column(ClauseIndex, &'a ColumnExpr),
    SourceColumn(ClauseIndex, &'a Spanned<String>),
    Function(ClauseIndex, &'a Spanned<AggregateFunction>),
    Alias(ClauseIndex, &'a Spanned<String>),
    Filter(usize, &'a FilterExpr),
    FilterColumn(usize, &'a Spanned<String>),
    Operator(usize, &'a Spanned<CompareOp>),
    Literal(usize, &'a Spanned<Literal>),
}

impl<'a> Node<'a> {
    pub fn span(&self) -> Span {
        match self {
            Node::Query(q) => q.span,
            Node::Select(s) => s.span,
            Node::Join(_, j) => j.span,
            Node::EventName(_, n)
            | Node::UsingEntity(_, n)
            | Node::SourceColumn(_, n)
            | Node::Alias(_, n)
            | Node::FilterColumn(_, n) => n.span,
            Node::Selector(_, s) => s.span,
            Node::Qualifier(_, q) => q.span,
            Node::Column(_, c) => c.span(),
            Node::Function(_, f) => f.span,
            Node::Filter(_, f) => f.span,
            Node::Operator(_, o) => o.span,
            Node::Literal(_, l) => l.span,
        }
    }
}

fn push_columns<'a>(nodes: &mut Vec<Node<'a>>, clause: ClauseIndex, columns: &'a [ColumnExpr]) {
    for column in columns {
        nodes.push(Node::Column(clause, column));
        match column {
            ColumnExpr::Reference {
                source_column,
                alias,
                ..
            } => {
                nodes.push(Node::SourceColumn(clause, source_column));
                nodes.push(Node::Alias(clause, alias));
            }
            ColumnExpr::Aggregation {
                function,
                argument_column,
                alias,
                ..
            } => {
                nodes.push(Node::Function(clause, function));
                nodes.push(Node::SourceColumn(clause, argument_column));
                nodes.push(Node::Alias(clause, alias));
            }
        }
    }
}

impl Query {
    /// Every node in the query, parents before children.
    pub fn nodes(&self) -> Vec<Node<'_>> {
        let mut nodes = vec![Node::Query(self), Node::Select(&self.select)];
        nodes.push(Node::Selector(None, &self.select.selector));
        nodes.push(Node::EventName(None, &self.select.event_name));
        push_columns(&mut nodes, None, &self.select.columns);

        for (i, join) in self.joins.iter().enumerate() {
            nodes.push(Node::Join(i, join));
            nodes.push(Node::Qualifier(i, &join.qualifier));
            nodes.push(Node::Selector(Some(i), &join.selector));
            nodes.push(Node::EventName(Some(i), &join.event_name));
            for entity in &join.using_entities {
                nodes.push(Node::UsingEntity(i, entity));
            }
            push_columns(&mut nodes, Some(i), &join.columns);
            if let Some(filter) = &join.filter {
                nodes.push(Node::Filter(i, filter));
                nodes.push(Node::FilterColumn(i, &filter.column));
                nodes.push(Node::Operator(i, &filter.operator));
                nodes.push(Node::Literal(i, &filter.literal));
            }
        }
        nodes
    }

    /// The innermost node whose span contains `pos`.
    ///
    /// Later nodes in [`Query::nodes`] are never ancestors of earlier ones,
    /// so the last enclosed match wins ties between equal spans.
    pub fn node_at(&self, pos: Position) -> Option<Node<'_>> {
        let mut best: Option<Node<'_>> = None;
        for node in self.nodes() {
            let span = node.span();
            if !span.contains(pos) {
                continue;
            }
            match &best {
                Some(current) if !current.span().encloses(&span) => {}
                _ => best = Some(node),
            }
        }
        best
    }

    /// Event name of a clause.
    pub fn event_name(&self, clause: ClauseIndex) -> Option<&str> {
        match clause {
            None => Some(self.select.event_name.value.as_str()),
            Some(i) => self.joins.get(i).map(|j| j.event_name.value.as_str()),
        }
    }
}
