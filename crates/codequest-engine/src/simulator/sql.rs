//! A single-table SQL simulator.
//!
//! Understands `SELECT` with an optional `WHERE` (`AND`/`OR`, comparison
//! operators and `LIKE`), `GROUP BY`, `ORDER BY` and the aggregates
//! `COUNT`, `SUM`, `AVG`, `MIN` and `MAX`, plus `INSERT INTO ... VALUES`.
//! Anything else is reported as an invalid statement.

use std::cmp::Ordering;

use codequest_types::{Cell, TableSnapshot};

use super::CommandOutcome;

/// The table a SQL level operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWorld {
    table: TableSnapshot,
}

impl TableWorld {
    /// Start from a level's table.
    pub fn new(snapshot: &TableSnapshot) -> Self {
        Self {
            table: snapshot.clone(),
        }
    }

    /// Current table contents.
    pub fn snapshot(&self) -> TableSnapshot {
        self.table.clone()
    }

    /// Run one statement.
    pub fn apply(&mut self, input: &str) -> CommandOutcome {
        let result = match parse(input) {
            Some(SqlCommand::Select(query)) => self.select(&query).map(CommandOutcome::output),
            Some(SqlCommand::Insert { table, values }) => self.insert(&table, values),
            None => Err(invalid(input)),
        };
        result.unwrap_or_else(CommandOutcome::output)
    }

    fn check_table(&self, name: &str) -> Result<(), String> {
        if name.eq_ignore_ascii_case(&self.table.name) {
            Ok(())
        } else {
            Err(format!("Error: no such table: {name}"))
        }
    }

    fn column(&self, name: &str) -> Result<usize, String> {
        self.table
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Error: no such column: {name}"))
    }

    fn select(&self, query: &Query) -> Result<String, String> {
        self.check_table(&query.table)?;

        let mut rows: Vec<&Vec<Cell>> = Vec::new();
        for row in &self.table.rows {
            if self.matches(row, &query.filter)? {
                rows.push(row);
            }
        }

        if let Some((column, descending)) = &query.order_by {
            let idx = self.column(column)?;
            rows.sort_by(|a, b| {
                let ord = compare(a.get(idx), b.get(idx)).unwrap_or(Ordering::Equal);
                if *descending { ord.reverse() } else { ord }
            });
        }

        let mut items = Vec::new();
        for item in &query.items {
            match item {
                Item::All => items.extend(self.table.columns.iter().cloned().map(Item::Column)),
                other => items.push(other.clone()),
            }
        }
        let headers: Vec<String> = items.iter().map(Item::header).collect();

        let aggregated = !query.group_by.is_empty() || items.iter().any(Item::is_aggregate);
        let output: Vec<Vec<Cell>> = if aggregated {
            let key_columns = query
                .group_by
                .iter()
                .map(|c| self.column(c))
                .collect::<Result<Vec<_>, _>>()?;
            let mut groups: Vec<(Vec<Cell>, Vec<&Vec<Cell>>)> = Vec::new();
            for row in rows {
                let key: Vec<Cell> = key_columns
                    .iter()
                    .filter_map(|&i| row.get(i).cloned())
                    .collect();
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, members)) => members.push(row),
                    None => groups.push((key, vec![row])),
                }
            }
            if groups.is_empty() && key_columns.is_empty() {
                groups.push((Vec::new(), Vec::new()));
            }
            groups
                .iter()
                .map(|(_, members)| {
                    items
                        .iter()
                        .map(|item| self.evaluate(item, members))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let indices = items
                .iter()
                .map(|item| match item {
                    Item::Column(c) => self.column(c),
                    _ => Ok(0),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.iter()
                .map(|row| {
                    indices
                        .iter()
                        .filter_map(|&i| row.get(i).cloned())
                        .collect()
                })
                .collect()
        };

        Ok(render_table(&headers, &output))
    }

    fn evaluate(&self, item: &Item, rows: &[&Vec<Cell>]) -> Result<Cell, String> {
        match item {
            Item::All => Ok(Cell::Text("*".to_owned())),
            Item::Column(c) => {
                let idx = self.column(c)?;
                Ok(rows
                    .first()
                    .and_then(|r| r.get(idx).cloned())
                    .unwrap_or_else(|| Cell::Text(String::new())))
            }
            Item::Aggregate(func, column) => {
                let values: Vec<&Cell> = match column {
                    Some(c) => {
                        let idx = self.column(c)?;
                        rows.iter().filter_map(|r| r.get(idx)).collect()
                    }
                    None => rows.iter().filter_map(|r| r.first()).collect(),
                };
                Ok(func.compute(&values))
            }
        }
    }

    fn matches(&self, row: &[Cell], filter: &[Vec<Condition>]) -> Result<bool, String> {
        if filter.is_empty() {
            return Ok(true);
        }
        for group in filter {
            let mut all = true;
            for condition in group {
                let idx = self.column(&condition.column)?;
                if !condition.holds(row.get(idx)) {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn insert(&mut self, table: &str, values: Vec<Cell>) -> Result<CommandOutcome, String> {
        self.check_table(table)?;
        let expected = self.table.columns.len();
        if values.len() != expected {
            return Err(format!(
                "Error: table {} has {expected} columns but {} values were supplied",
                self.table.name,
                values.len()
            ));
        }
        self.table.rows.push(values);
        Ok(CommandOutcome::changed("1 row inserted"))
    }
}

fn invalid(input: &str) -> String {
    format!("Error: \"{}\" is not a valid SQL statement", input.trim())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum SqlCommand {
    Select(Query),
    Insert { table: String, values: Vec<Cell> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Query {
    items: Vec<Item>,
    table: String,
    /// Disjunction of conjunctions.
    filter: Vec<Vec<Condition>>,
    group_by: Vec<String>,
    order_by: Option<(String, bool)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    All,
    Column(String),
    /// `None` means `*`.
    Aggregate(Aggregate, Option<String>),
}

impl Item {
    fn header(&self) -> String {
        match self {
            Self::All => "*".to_owned(),
            Self::Column(c) => c.clone(),
            Self::Aggregate(func, column) => {
                format!("{}({})", func.name(), column.as_deref().unwrap_or("*"))
            }
        }
    }

    const fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    fn compute(self, values: &[&Cell]) -> Cell {
        let count = i64::try_from(values.len()).unwrap_or(i64::MAX);
        let sum = values
            .iter()
            .filter_map(|c| match c {
                Cell::Integer(n) => Some(*n),
                Cell::Text(_) => None,
            })
            .fold(0_i64, i64::saturating_add);
        match self {
            Self::Count => Cell::Integer(count),
            Self::Sum => Cell::Integer(sum),
            Self::Avg => Cell::Text(format_average(sum, count)),
            Self::Min => extreme(values, Ordering::Less),
            Self::Max => extreme(values, Ordering::Greater),
        }
    }
}

fn extreme(values: &[&Cell], wanted: Ordering) -> Cell {
    values
        .iter()
        .copied()
        .reduce(|best, c| {
            if compare(Some(c), Some(best)) == Some(wanted) {
                c
            } else {
                best
            }
        })
        .cloned()
        .unwrap_or_else(|| Cell::Text("NULL".to_owned()))
}

/// Average to two decimal places without leaving integer arithmetic.
fn format_average(sum: i64, count: i64) -> String {
    let (Some(whole), Some(rem)) = (sum.checked_div(count), sum.checked_rem(count)) else {
        return "NULL".to_owned();
    };
    let cents = rem
        .saturating_mul(100)
        .checked_div(count)
        .unwrap_or(0)
        .unsigned_abs();
    format!("{whole}.{cents:02}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    column: String,
    op: Op,
    value: Cell,
}

impl Condition {
    fn holds(&self, cell: Option<&Cell>) -> bool {
        if self.op == Op::Like {
            let (Some(Cell::Text(text)), Cell::Text(pattern)) = (cell, &self.value) else {
                return false;
            };
            let text: Vec<char> = text.chars().collect();
            let pattern: Vec<char> = pattern.chars().collect();
            return like_match(&text, &pattern);
        }
        let Some(ord) = compare(cell, Some(&self.value)) else {
            return false;
        };
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
            Op::Gt => ord == Ordering::Greater,
            Op::Lt => ord == Ordering::Less,
            Op::Ge => ord != Ordering::Less,
            Op::Le => ord != Ordering::Greater,
            Op::Like => false,
        }
    }
}

fn compare(a: Option<&Cell>, b: Option<&Cell>) -> Option<Ordering> {
    match (a?, b?) {
        (Cell::Integer(x), Cell::Integer(y)) => Some(x.cmp(y)),
        (Cell::Text(x), Cell::Text(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// SQL `LIKE`: `%` matches any run, `_` one character, case-insensitive.
fn like_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len())
            .any(|i| text.get(i..).is_some_and(|tail| like_match(tail, rest))),
        Some(('_', rest)) => text
            .split_first()
            .is_some_and(|(_, tail)| like_match(tail, rest)),
        Some((p, rest)) => text.split_first().is_some_and(|(t, tail)| {
            t.to_lowercase().eq(p.to_lowercase()) && like_match(tail, rest)
        }),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse(input: &str) -> Option<SqlCommand> {
    let text = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = text.trim_end_matches(';').trim_end();
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("select ") {
        parse_select(text.get("select ".len()..)?).map(SqlCommand::Select)
    } else if lower.starts_with("insert into ") {
        parse_insert(text.get("insert into ".len()..)?)
    } else {
        None
    }
}

fn parse_select(body: &str) -> Option<Query> {
    let (items_text, rest) = split_keyword(body, "from")?;
    let items = items_text
        .split(',')
        .map(|s| parse_item(s.trim()))
        .collect::<Option<Vec<_>>>()?;

    let mut words = rest.splitn(2, ' ');
    let table = words.next().filter(|t| !t.is_empty())?.to_owned();
    let tail = format!(" {}", words.next().unwrap_or(""));

    let (head, order) = split_keyword(&tail, "order by").unwrap_or((tail.as_str(), ""));
    let (head, group) = split_keyword(head, "group by").unwrap_or((head, ""));
    let (head, filter) = split_keyword(head, "where").unwrap_or((head, ""));
    if !head.trim().is_empty() {
        return None;
    }

    let filter = if filter.trim().is_empty() {
        Vec::new()
    } else {
        split_all(filter, "or")
            .into_iter()
            .map(|part| {
                split_all(part, "and")
                    .into_iter()
                    .map(parse_condition)
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()?
    };

    let group_by = if group.trim().is_empty() {
        Vec::new()
    } else {
        group.split(',').map(|c| c.trim().to_owned()).collect()
    };

    let order_by = if order.trim().is_empty() {
        None
    } else {
        let mut parts = order.split_whitespace();
        let column = parts.next()?.trim_end_matches(',').to_owned();
        let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(_) => return None,
        };
        Some((column, descending))
    };

    Some(Query {
        items,
        table,
        filter,
        group_by,
        order_by,
    })
}

fn parse_item(text: &str) -> Option<Item> {
    if text == "*" {
        return Some(Item::All);
    }
    if let Some((name, rest)) = text.split_once('(') {
        let func = Aggregate::from_name(name.trim())?;
        let arg = rest.strip_suffix(')')?.trim();
        let column = (arg != "*").then(|| arg.to_owned());
        return Some(Item::Aggregate(func, column));
    }
    let valid = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| Item::Column(text.to_owned()))
}

fn parse_condition(text: &str) -> Option<Condition> {
    if let Some((column, value)) = split_keyword(text, "like") {
        return Some(Condition {
            column: column.trim().to_owned(),
            op: Op::Like,
            value: parse_literal(value.trim()),
        });
    }
    const OPERATORS: [(&str, Op); 7] = [
        ("<>", Op::Ne),
        ("!=", Op::Ne),
        (">=", Op::Ge),
        ("<=", Op::Le),
        ("=", Op::Eq),
        (">", Op::Gt),
        ("<", Op::Lt),
    ];
    let mut best: Option<(usize, &str, Op)> = None;
    for (symbol, op) in OPERATORS {
        let Some(pos) = text.find(symbol) else {
            continue;
        };
        if best.is_none_or(|(b, _, _)| pos < b) {
            best = Some((pos, symbol, op));
        }
    }
    let (pos, symbol, op) = best?;
    let column = text.get(..pos)?.trim();
    let value = text.get(pos.checked_add(symbol.len())?..)?.trim();
    if column.is_empty() || value.is_empty() {
        return None;
    }
    Some(Condition {
        column: column.to_owned(),
        op,
        value: parse_literal(value),
    })
}

fn parse_insert(body: &str) -> Option<SqlCommand> {
    let (table, rest) = body.split_once(' ')?;
    let rest = rest.trim();
    if !rest.get(..6)?.eq_ignore_ascii_case("values") {
        return None;
    }
    let inner = rest
        .get(6..)?
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let values = split_values(inner)
        .iter()
        .map(|v| parse_literal(v.trim()))
        .collect();
    Some(SqlCommand::Insert {
        table: table.to_owned(),
        values,
    })
}

fn parse_literal(text: &str) -> Cell {
    let unquoted = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')));
    match unquoted {
        Some(inner) => Cell::Text(inner.to_owned()),
        None => text
            .parse::<i64>()
            .map_or_else(|_| Cell::Text(text.to_owned()), Cell::Integer),
    }
}

/// Split a `VALUES` list on commas outside quotes.
fn split_values(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => values.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }
    values.push(current);
    values
}

/// Split `text` at the first ` keyword ` (case-insensitive).
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let needle = format!(" {keyword} ");
    let pos = text.to_ascii_lowercase().find(&needle)?;
    let after = pos.checked_add(needle.len())?;
    Some((text.get(..pos)?, text.get(after..)?))
}

/// Split `text` at every ` keyword ` (case-insensitive).
fn split_all<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some((head, tail)) = split_keyword(rest, keyword) {
        parts.push(head);
        rest = tail;
    }
    parts.push(rest);
    parts
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render rows as an aligned text grid with a row count footer.
pub fn render_table(headers: &[String], rows: &[Vec<Cell>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.to_string().chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_owned()
    };

    let mut out = vec![line(headers.to_vec())];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push(line(row.iter().map(ToString::to_string).collect()));
    }
    let noun = if rows.len() == 1 { "row" } else { "rows" };
    out.push(format!("({} {noun})", rows.len()));
    out.join("\n")
}
