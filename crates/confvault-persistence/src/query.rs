//! Condition-mapping query engine
//!
//! Every lookup and listing goes through here: a `Conds` mapping of
//! column name to scalar value (equality, AND-combined) is compiled against an
//! entity's column catalogue into a predicate plus positional binds. Adding a
//! queryable column to an entity needs no new predicate code.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, IdenStatic, Iterable, Order,
    PrimaryKeyToColumn, QueryFilter, QueryOrder, QuerySelect, Select, Value, prelude::Expr,
    sea_query::Asterisk,
};

use confvault_common::{ConfVaultError, PersistenceContext, Result};

use crate::model::{Page, PageRequest};

/// Field-equality conditions plus an optional order clause.
///
/// Fields are kept sorted by name so the compiled predicate and its bind list
/// are deterministic for a given mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conds {
    fields: BTreeMap<String, Value>,
    order: Vec<(String, Order)>,
}

impl Conds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field = value`, replacing an earlier value for the same field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn order_asc(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), Order::Asc));
        self
    }

    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), Order::Desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build conditions from a loosely typed JSON object.
    ///
    /// Only scalars are accepted; `null`, arrays and objects have no equality
    /// meaning and are rejected.
    pub fn from_json(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut conds = Self::new();
        for (field, value) in map {
            let value = match value {
                serde_json::Value::Bool(b) => Value::from(*b),
                serde_json::Value::String(s) => Value::from(s.clone()),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Value::from(i)
                    } else if let Some(u) = n.as_u64() {
                        Value::from(u)
                    } else if let Some(f) = n.as_f64() {
                        Value::from(f)
                    } else {
                        return Err(ConfVaultError::IllegalArgument(format!(
                            "condition '{field}' has an unsupported number"
                        )));
                    }
                }
                other => {
                    return Err(ConfVaultError::IllegalArgument(format!(
                        "condition '{field}' must be a scalar, got {other}"
                    )));
                }
            };
            conds.insert(field.clone(), value);
        }
        Ok(conds)
    }
}

/// Conditions resolved against the columns of entity `E`
#[derive(Clone, Debug)]
pub struct CompiledQuery<E: EntityTrait> {
    predicates: Vec<(E::Column, Value)>,
    order: Vec<(E::Column, Order)>,
}

impl<E: EntityTrait> CompiledQuery<E> {
    /// The predicate; an empty mapping yields the match-all condition
    pub fn condition(&self) -> Condition {
        self.predicates
            .iter()
            .fold(Condition::all(), |cond, (col, value)| {
                cond.add(col.eq(value.clone()))
            })
    }

    /// Bound values in predicate order
    pub fn binds(&self) -> Vec<Value> {
        self.predicates.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn is_match_all(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Apply the predicate only
    pub fn filter(&self, select: Select<E>) -> Select<E> {
        if self.predicates.is_empty() {
            select
        } else {
            select.filter(self.condition())
        }
    }

    /// Apply the predicate and the order clause
    pub fn apply(&self, select: Select<E>) -> Select<E> {
        self.order
            .iter()
            .fold(self.filter(select), |select, (col, order)| {
                select.order_by(*col, order.clone())
            })
    }
}

impl<E: EntityTrait> fmt::Display for CompiledQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return f.write_str("1 = 1");
        }
        let text = self
            .predicates
            .iter()
            .map(|(col, _)| format!("{} = ?", IdenStatic::as_str(col)))
            .collect::<Vec<_>>()
            .join(" AND ");
        f.write_str(&text)
    }
}

/// Compile `conds` against the column catalogue of `E`
pub fn compile<E: EntityTrait>(conds: &Conds) -> Result<CompiledQuery<E>> {
    let entity = E::default();
    let resolve = |field: &str| {
        E::Column::from_str(field).map_err(|_| ConfVaultError::UnknownField {
            entity: entity.table_name().to_string(),
            field: field.to_string(),
        })
    };

    let mut predicates = Vec::with_capacity(conds.fields.len());
    for (field, value) in &conds.fields {
        predicates.push((resolve(field)?, value.clone()));
    }
    let mut order = Vec::with_capacity(conds.order.len());
    for (field, direction) in &conds.order {
        order.push((resolve(field)?, direction.clone()));
    }

    Ok(CompiledQuery { predicates, order })
}

/// First row matching `conds`, `None` when nothing matches
pub async fn find_one<E, C>(db: &C, conds: &Conds) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let entity = E::default();
    let compiled = compile::<E>(conds)?;
    tracing::debug!(entity = entity.table_name(), predicate = %compiled, "find one");

    compiled
        .apply(E::find())
        .one(db)
        .await
        .persistence("find_one", entity.table_name(), None)
}

/// All rows matching `conds`, in the order clause of `conds` if any
pub async fn find_all<E, C>(db: &C, conds: &Conds) -> Result<Vec<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let entity = E::default();
    let compiled = compile::<E>(conds)?;
    tracing::debug!(entity = entity.table_name(), predicate = %compiled, "find all");

    compiled
        .apply(E::find())
        .all(db)
        .await
        .persistence("find_all", entity.table_name(), None)
}

/// Number of rows matching `conds`
pub async fn count<E, C>(db: &C, conds: &Conds) -> Result<u64>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let entity = E::default();
    let compiled = compile::<E>(conds)?;

    let total = compiled
        .filter(E::find())
        .select_only()
        .column_as(Expr::col(Asterisk).count(), "count")
        .into_tuple::<i64>()
        .one(db)
        .await
        .persistence("count", entity.table_name(), None)?
        .unwrap_or_default();

    Ok(u64::try_from(total).unwrap_or_default())
}

/// One page of rows matching `conds`, newest (highest id) first.
///
/// Id-descending is the only page order; an order clause in `conds` is
/// ignored here. `total_count` counts every matching row.
pub async fn find_page<E, C>(db: &C, conds: &Conds, page: PageRequest) -> Result<Page<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let entity = E::default();
    let page = page.normalize();
    let compiled = compile::<E>(conds)?;
    tracing::debug!(
        entity = entity.table_name(),
        predicate = %compiled,
        page_no = page.page_no,
        page_size = page.page_size,
        "find page"
    );

    let total_count = count::<E, C>(db, conds).await?;
    if total_count == 0 {
        return Ok(Page::new(0, page.page_no, page.page_size, Vec::new()));
    }

    let select = E::PrimaryKey::iter().fold(compiled.filter(E::find()), |select, key| {
        select.order_by_desc(key.into_column())
    });
    let page_items = select
        .offset(page.offset())
        .limit(page.page_size)
        .all(db)
        .await
        .persistence("find_page", entity.table_name(), None)?;

    Ok(Page::new(
        total_count,
        page.page_no,
        page.page_size,
        page_items,
    ))
}
