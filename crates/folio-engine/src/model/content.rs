//! # Content Expressions
//!
//! Every node type declares which children it accepts with a small grammar,
//! e.g. `"paragraph block*"` or `"list_item+"`. The expression is parsed, compiled
//! to an NFA and then determinized, so that matching a sequence of children is a
//! walk over a table of `(type, next state)` edges.
//!
//! ```text
//! expr      := seq ('|' seq)*
//! seq       := subscript+
//! subscript := atom ('*' | '+' | '?' | '{' n (',' m?)? '}')*
//! atom      := name | '(' expr ')'
//! ```
//!
//! A name is either a node type or a group; a group expands to a choice of all its
//! member types in schema order.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid content expression '{source_expr}': {message}")]
pub struct ContentExprError {
    pub source_expr: String,
    pub message: String,
}

/// Deterministic content automaton of one node type. State 0 is the start state.
#[derive(Debug, Clone)]
pub(crate) struct Automaton {
    pub(crate) states: Vec<DfaState>,
}

#[derive(Debug, Clone)]
pub(crate) struct DfaState {
    pub(crate) valid_end: bool,
    /// Outgoing edges as `(node type id, target state)` in expression order.
    pub(crate) next: Vec<(usize, usize)>,
}

impl Automaton {
    /// Automaton accepting only the empty sequence (leaf nodes).
    pub(crate) fn empty() -> Self {
        Self {
            states: vec![DfaState {
                valid_end: true,
                next: Vec::new(),
            }],
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.states.len() == 1 && self.states[0].next.is_empty()
    }

    /// Compile a content expression. `types` lists every node type as
    /// `(name, groups)` in schema order; ids are indices into that slice.
    pub(crate) fn compile(
        source: &str,
        types: &[(String, Vec<String>)],
    ) -> Result<Self, ContentExprError> {
        let tokens = tokenize(source);
        if tokens.is_empty() {
            return Ok(Self::empty());
        }

        let mut parser = ExprParser {
            source,
            tokens,
            pos: 0,
            types,
        };
        let expr = parser.parse_expr()?;
        if let Some(token) = parser.peek() {
            return Err(parser.error(format!("unexpected trailing token '{token}'")));
        }

        let mut nfa = Nfa::default();
        nfa.node();
        let out = nfa.compile(&expr, 0);
        let accept = nfa.node();
        nfa.connect(&out, accept);

        Ok(DfaBuilder::new(&nfa).build())
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Choice(Vec<Expr>),
    Seq(Vec<Expr>),
    Plus(Box<Expr>),
    Star(Box<Expr>),
    Opt(Box<Expr>),
    Range {
        expr: Box<Expr>,
        min: usize,
        max: Option<usize>,
    },
    Name(usize),
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphanumeric() || c == '_' {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(word);
        } else {
            tokens.push(c.to_string());
            chars.next();
        }
    }
    tokens
}

struct ExprParser<'a> {
    source: &'a str,
    tokens: Vec<String>,
    pos: usize,
    types: &'a [(String, Vec<String>)],
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ContentExprError {
        ContentExprError {
            source_expr: self.source.to_string(),
            message: message.into(),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ContentExprError> {
        let mut exprs = vec![self.parse_seq()?];
        while self.eat("|") {
            exprs.push(self.parse_seq()?);
        }
        Ok(if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Choice(exprs)
        })
    }

    fn parse_seq(&mut self) -> Result<Expr, ContentExprError> {
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_subscript()?);
            match self.peek() {
                None | Some(")") | Some("|") => break,
                _ => {}
            }
        }
        Ok(if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Seq(exprs)
        })
    }

    fn parse_subscript(&mut self) -> Result<Expr, ContentExprError> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat("+") {
                expr = Expr::Plus(Box::new(expr));
            } else if self.eat("*") {
                expr = Expr::Star(Box::new(expr));
            } else if self.eat("?") {
                expr = Expr::Opt(Box::new(expr));
            } else if self.eat("{") {
                expr = self.parse_range(expr)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_number(&mut self) -> Result<usize, ContentExprError> {
        let token = self.peek().unwrap_or_default().to_string();
        let value = token
            .parse::<usize>()
            .map_err(|_| self.error(format!("expected number, got '{token}'")))?;
        self.pos += 1;
        Ok(value)
    }

    fn parse_range(&mut self, expr: Expr) -> Result<Expr, ContentExprError> {
        let min = self.parse_number()?;
        let max = if self.eat(",") {
            if self.peek() == Some("}") {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        if !self.eat("}") {
            return Err(self.error("unclosed braced range"));
        }
        if let Some(max) = max
            && max < min
        {
            return Err(self.error(format!("range maximum {max} is below minimum {min}")));
        }
        Ok(Expr::Range {
            expr: Box::new(expr),
            min,
            max,
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, ContentExprError> {
        if self.eat("(") {
            let expr = self.parse_expr()?;
            if !self.eat(")") {
                return Err(self.error("missing closing paren"));
            }
            return Ok(expr);
        }

        let Some(token) = self.peek().map(str::to_string) else {
            return Err(self.error("unexpected end of expression"));
        };
        if !token.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(self.error(format!("unexpected token '{token}'")));
        }
        self.pos += 1;

        let ids = self.resolve_name(&token);
        match ids.len() {
            0 => Err(self.error(format!("no node type or group '{token}' found"))),
            1 => Ok(Expr::Name(ids[0])),
            _ => Ok(Expr::Choice(ids.into_iter().map(Expr::Name).collect())),
        }
    }

    fn resolve_name(&self, name: &str) -> Vec<usize> {
        if let Some(id) = self.types.iter().position(|(type_name, _)| type_name == name) {
            return vec![id];
        }
        self.types
            .iter()
            .enumerate()
            .filter(|(_, (_, groups))| groups.iter().any(|group| group == name))
            .map(|(id, _)| id)
            .collect()
    }
}

#[derive(Debug)]
struct NfaEdge {
    term: Option<usize>,
    to: Option<usize>,
}

#[derive(Debug, Default)]
struct Nfa {
    nodes: Vec<Vec<usize>>,
    edges: Vec<NfaEdge>,
}

impl Nfa {
    fn node(&mut self) -> usize {
        self.nodes.push(Vec::new());
        self.nodes.len() - 1
    }

    fn edge(&mut self, from: usize, to: Option<usize>, term: Option<usize>) -> usize {
        self.edges.push(NfaEdge { term, to });
        let id = self.edges.len() - 1;
        self.nodes[from].push(id);
        id
    }

    fn connect(&mut self, edges: &[usize], to: usize) {
        for &edge in edges {
            self.edges[edge].to = Some(to);
        }
    }

    /// Returns the dangling edges leaving the compiled fragment.
    fn compile(&mut self, expr: &Expr, from: usize) -> Vec<usize> {
        match expr {
            Expr::Choice(exprs) => exprs.iter().flat_map(|expr| self.compile(expr, from)).collect(),
            Expr::Seq(exprs) => {
                let mut from = from;
                let mut out = Vec::new();
                for (i, expr) in exprs.iter().enumerate() {
                    out = self.compile(expr, from);
                    if i + 1 < exprs.len() {
                        from = self.node();
                        self.connect(&out, from);
                    }
                }
                out
            }
            Expr::Star(expr) => {
                let looped = self.node();
                self.edge(from, Some(looped), None);
                let inner = self.compile(expr, looped);
                self.connect(&inner, looped);
                vec![self.edge(looped, None, None)]
            }
            Expr::Plus(expr) => {
                let looped = self.node();
                let first = self.compile(expr, from);
                self.connect(&first, looped);
                let again = self.compile(expr, looped);
                self.connect(&again, looped);
                vec![self.edge(looped, None, None)]
            }
            Expr::Opt(expr) => {
                let mut out = vec![self.edge(from, None, None)];
                out.extend(self.compile(expr, from));
                out
            }
            Expr::Range { expr, min, max } => {
                let mut cur = from;
                for _ in 0..*min {
                    let next = self.node();
                    let inner = self.compile(expr, cur);
                    self.connect(&inner, next);
                    cur = next;
                }
                match max {
                    None => {
                        let inner = self.compile(expr, cur);
                        self.connect(&inner, cur);
                    }
                    Some(max) => {
                        for _ in *min..*max {
                            let next = self.node();
                            self.edge(cur, Some(next), None);
                            let inner = self.compile(expr, cur);
                            self.connect(&inner, next);
                            cur = next;
                        }
                    }
                }
                vec![self.edge(cur, None, None)]
            }
            Expr::Name(id) => vec![self.edge(from, None, Some(*id))],
        }
    }

    /// All nodes reachable from `node` through null edges, sorted.
    fn null_from(&self, node: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        self.scan(node, &mut result, &mut visited);
        result.sort_unstable();
        result
    }

    fn scan(&self, node: usize, result: &mut Vec<usize>, visited: &mut [bool]) {
        if visited[node] {
            return;
        }
        visited[node] = true;

        let edges = &self.nodes[node];
        if let [only] = edges.as_slice() {
            let edge = &self.edges[*only];
            if edge.term.is_none()
                && let Some(to) = edge.to
            {
                return self.scan(to, result, visited);
            }
        }

        result.push(node);
        for &edge in edges {
            let edge = &self.edges[edge];
            if edge.term.is_none()
                && let Some(to) = edge.to
            {
                self.scan(to, result, visited);
            }
        }
    }
}

struct DfaBuilder<'a> {
    nfa: &'a Nfa,
    accept: usize,
    states: Vec<DfaState>,
    labeled: HashMap<Vec<usize>, usize>,
}

impl<'a> DfaBuilder<'a> {
    fn new(nfa: &'a Nfa) -> Self {
        Self {
            nfa,
            accept: nfa.nodes.len() - 1,
            states: Vec::new(),
            labeled: HashMap::new(),
        }
    }

    fn build(mut self) -> Automaton {
        let start = self.nfa.null_from(0);
        self.explore(start);
        Automaton { states: self.states }
    }

    fn explore(&mut self, set: Vec<usize>) -> usize {
        let mut out: Vec<(usize, Vec<usize>)> = Vec::new();
        for &node in &set {
            for &edge in &self.nfa.nodes[node] {
                let edge = &self.nfa.edges[edge];
                let (Some(term), Some(to)) = (edge.term, edge.to) else {
                    continue;
                };
                let slot = match out.iter().position(|(t, _)| *t == term) {
                    Some(slot) => slot,
                    None => {
                        out.push((term, Vec::new()));
                        out.len() - 1
                    }
                };
                for target in self.nfa.null_from(to) {
                    if !out[slot].1.contains(&target) {
                        out[slot].1.push(target);
                    }
                }
            }
        }

        let id = self.states.len();
        self.states.push(DfaState {
            valid_end: set.contains(&self.accept),
            next: Vec::new(),
        });
        self.labeled.insert(set, id);

        for (term, mut targets) in out {
            targets.sort_unstable();
            let next = match self.labeled.get(&targets) {
                Some(&next) => next,
                None => self.explore(targets),
            };
            self.states[id].next.push((term, next));
        }
        id
    }
}
