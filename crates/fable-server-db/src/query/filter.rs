// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Filter/order compiler.
//!
//! Turns the flat query-string grammar (`where__id__more_than=5`,
//! `order__createdAt=DESC`) into typed predicate clauses and sort directives
//! against an entity's registered field table. The operator set is closed:
//! a key naming an operator outside [`FilterOp`] is a configuration fault,
//! not client input error, and is reported as such.
//!
//! Key grammar, split on `__`:
//! - `where__<field>` - equality on `<field>`
//! - `where__<field>__<operator>` - operator applied to `<field>`; a
//!   comma-separated value becomes a list before the predicate is built
//! - `order__<field>` - sort directive, value must be `ASC` or `DESC`
//! - anything else is malformed

use crate::query::descriptor::QueryDescriptor;

/// Sort direction for an order directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
	Asc,
	#[default]
	Desc,
}

impl SortDirection {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.to_ascii_uppercase().as_str() {
			"ASC" => Some(SortDirection::Asc),
			"DESC" => Some(SortDirection::Desc),
			_ => None,
		}
	}

	pub fn as_sql(&self) -> &'static str {
		match self {
			SortDirection::Asc => "ASC",
			SortDirection::Desc => "DESC",
		}
	}
}

/// Storage type of a filterable field, used to parse incoming values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	Integer,
	Boolean,
	Text,
	/// RFC 3339 TEXT column; compared lexicographically, so values pass
	/// through unparsed.
	Timestamp,
}

/// One entry in an entity's field table: the wire name clients use and the
/// column it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
	pub name: &'static str,
	pub column: &'static str,
	pub kind: FieldKind,
}

impl FieldDef {
	pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
		Self { name, column, kind }
	}
}

/// The registered filterable/sortable fields of an entity.
///
/// Registration happens once, in the entity's [`PagedEntity`] impl, giving
/// load-time validation of filter keys instead of runtime reflection.
///
/// [`PagedEntity`]: crate::query::paginate::PagedEntity
#[derive(Debug, Clone, Copy)]
pub struct EntityFields {
	fields: &'static [FieldDef],
}

impl EntityFields {
	pub const fn new(fields: &'static [FieldDef]) -> Self {
		Self { fields }
	}

	pub fn lookup(&self, name: &str) -> Option<&'static FieldDef> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Build an equality clause against a registered field. Used by callers
	/// supplying override constraints (e.g. "comments of post X").
	pub fn equals(&self, name: &str, value: FilterValue) -> Result<Clause, QueryError> {
		let field = self.lookup(name).ok_or_else(|| QueryError::UnknownField {
			key: name.to_string(),
			field: name.to_string(),
		})?;
		Ok(Clause {
			field,
			op: FilterOp::Equal,
			values: vec![value],
		})
	}
}

/// The closed set of filter operators.
///
/// Extending the grammar means adding a variant here and a match arm in
/// `parse` and `sql_comparator`; exhaustiveness checking keeps the two in
/// sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
	Equal,
	Not,
	MoreThan,
	MoreThanOrEqual,
	LessThan,
	LessThanOrEqual,
	Like,
	ILike,
	Between,
	In,
	IsNull,
}

impl FilterOp {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"equal" => Some(FilterOp::Equal),
			"not" => Some(FilterOp::Not),
			"more_than" => Some(FilterOp::MoreThan),
			"more_than_or_equal" => Some(FilterOp::MoreThanOrEqual),
			"less_than" => Some(FilterOp::LessThan),
			"less_than_or_equal" => Some(FilterOp::LessThanOrEqual),
			"like" => Some(FilterOp::Like),
			"i_like" => Some(FilterOp::ILike),
			"between" => Some(FilterOp::Between),
			"in" => Some(FilterOp::In),
			"is_null" => Some(FilterOp::IsNull),
			_ => None,
		}
	}

	/// SQL comparator for single-value operators.
	///
	/// SQLite's LIKE is already case-insensitive for ASCII, so `i_like`
	/// compiles to the same comparator as `like`.
	pub(crate) fn sql_comparator(&self) -> &'static str {
		match self {
			FilterOp::Equal => "=",
			FilterOp::Not => "!=",
			FilterOp::MoreThan => ">",
			FilterOp::MoreThanOrEqual => ">=",
			FilterOp::LessThan => "<",
			FilterOp::LessThanOrEqual => "<=",
			FilterOp::Like | FilterOp::ILike => "LIKE",
			FilterOp::Between | FilterOp::In | FilterOp::IsNull => {
				unreachable!("multi-value operators render their own SQL")
			}
		}
	}
}

/// A typed filter value, parsed according to the target field's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	Int(i64),
	Bool(bool),
	Text(String),
}

/// A single compiled predicate: all clauses of a query AND together.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
	pub field: &'static FieldDef,
	pub op: FilterOp,
	pub values: Vec<FilterValue>,
}

/// The compiled form of a query descriptor's filter/order keys.
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
	pub clauses: Vec<Clause>,
	pub order: Vec<(&'static FieldDef, SortDirection)>,
}

impl CompiledQuery {
	/// Direction of the primary sort directive; `DESC` when none was given.
	pub fn sort_direction(&self) -> SortDirection {
		self
			.order
			.first()
			.map(|(_, dir)| *dir)
			.unwrap_or_default()
	}
}

/// Errors produced while compiling a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("malformed filter key: {key}")]
	MalformedKey { key: String },

	#[error("unknown field '{field}' in filter key: {key}")]
	UnknownField { key: String, field: String },

	/// An operator outside the registered set. This is a deployment bug, not
	/// bad client input.
	#[error("unregistered filter operator '{operator}' in key: {key}")]
	UnknownOperator { key: String, operator: String },

	#[error("invalid value '{value}' for key: {key}")]
	InvalidValue { key: String, value: String },

	#[error("invalid pagination parameter {key}: {value}")]
	InvalidParam { key: String, value: String },
}

impl QueryError {
	/// Whether this error should be reported as client input error (400) as
	/// opposed to a server-side configuration fault (500).
	pub fn is_user_error(&self) -> bool {
		!matches!(self, QueryError::UnknownOperator { .. })
	}
}

fn parse_value(field: &FieldDef, key: &str, raw: &str) -> Result<FilterValue, QueryError> {
	match field.kind {
		FieldKind::Integer => raw
			.parse::<i64>()
			.map(FilterValue::Int)
			.map_err(|_| QueryError::InvalidValue {
				key: key.to_string(),
				value: raw.to_string(),
			}),
		FieldKind::Boolean => match raw {
			"true" | "1" => Ok(FilterValue::Bool(true)),
			"false" | "0" => Ok(FilterValue::Bool(false)),
			_ => Err(QueryError::InvalidValue {
				key: key.to_string(),
				value: raw.to_string(),
			}),
		},
		FieldKind::Text | FieldKind::Timestamp => Ok(FilterValue::Text(raw.to_string())),
	}
}

fn compile_where(
	fields: &EntityFields,
	key: &str,
	field_name: &str,
	op: FilterOp,
	raw_value: &str,
) -> Result<Clause, QueryError> {
	let field = fields
		.lookup(field_name)
		.ok_or_else(|| QueryError::UnknownField {
			key: key.to_string(),
			field: field_name.to_string(),
		})?;

	// A comma-separated value is a list; split before building the predicate.
	let raw_values: Vec<&str> = if raw_value.contains(',') {
		raw_value.split(',').collect()
	} else {
		vec![raw_value]
	};

	let values = match op {
		FilterOp::IsNull => Vec::new(),
		FilterOp::Between => {
			if raw_values.len() != 2 {
				return Err(QueryError::InvalidValue {
					key: key.to_string(),
					value: raw_value.to_string(),
				});
			}
			raw_values
				.iter()
				.map(|v| parse_value(field, key, v))
				.collect::<Result<Vec<_>, _>>()?
		}
		FilterOp::In => raw_values
			.iter()
			.map(|v| parse_value(field, key, v))
			.collect::<Result<Vec<_>, _>>()?,
		_ => {
			if raw_values.len() != 1 {
				return Err(QueryError::InvalidValue {
					key: key.to_string(),
					value: raw_value.to_string(),
				});
			}
			vec![parse_value(field, key, raw_values[0])?]
		}
	};

	Ok(Clause { field, op, values })
}

/// Compile a descriptor's raw filter/order keys against an entity's field
/// table.
///
/// The result is an immutable value built by a single fold over the ordered
/// key sequence; compilation fails fast on the first bad key, before any
/// query executes.
pub fn compile(
	descriptor: &QueryDescriptor,
	fields: &EntityFields,
) -> Result<CompiledQuery, QueryError> {
	descriptor
		.filters()
		.iter()
		.try_fold(CompiledQuery::default(), |mut compiled, (key, value)| {
			let parts: Vec<&str> = key.split("__").collect();
			match parts.as_slice() {
				["where", field_name] => {
					compiled.clauses.push(compile_where(
						fields,
						key,
						field_name,
						FilterOp::Equal,
						value,
					)?);
				}
				["where", field_name, op_raw] => {
					let op = FilterOp::parse(op_raw).ok_or_else(|| QueryError::UnknownOperator {
						key: key.clone(),
						operator: op_raw.to_string(),
					})?;
					compiled
						.clauses
						.push(compile_where(fields, key, field_name, op, value)?);
				}
				["order", field_name] => {
					let field =
						fields
							.lookup(field_name)
							.ok_or_else(|| QueryError::UnknownField {
								key: key.clone(),
								field: field_name.to_string(),
							})?;
					let direction =
						SortDirection::parse(value).ok_or_else(|| QueryError::InvalidValue {
							key: key.clone(),
							value: value.clone(),
						})?;
					compiled.order.push((field, direction));
				}
				_ => {
					return Err(QueryError::MalformedKey { key: key.clone() });
				}
			}
			Ok(compiled)
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIELDS: EntityFields = EntityFields::new(&[
		FieldDef::new("id", "id", FieldKind::Integer),
		FieldDef::new("title", "title", FieldKind::Text),
		FieldDef::new("likeCount", "like_count", FieldKind::Integer),
		FieldDef::new("isConfirmed", "is_confirmed", FieldKind::Boolean),
		FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
	]);

	fn descriptor(pairs: &[(&str, &str)]) -> QueryDescriptor {
		QueryDescriptor::from_pairs(
			pairs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string())),
		)
		.unwrap()
	}

	#[test]
	fn test_two_part_where_is_equality() {
		let compiled = compile(&descriptor(&[("where__title", "hello")]), &FIELDS).unwrap();
		assert_eq!(compiled.clauses.len(), 1);
		let clause = &compiled.clauses[0];
		assert_eq!(clause.op, FilterOp::Equal);
		assert_eq!(clause.field.column, "title");
		assert_eq!(clause.values, vec![FilterValue::Text("hello".to_string())]);
	}

	#[test]
	fn test_three_part_where_dispatches_operator() {
		let compiled = compile(&descriptor(&[("where__id__more_than", "5")]), &FIELDS).unwrap();
		let clause = &compiled.clauses[0];
		assert_eq!(clause.op, FilterOp::MoreThan);
		assert_eq!(clause.values, vec![FilterValue::Int(5)]);
	}

	#[test]
	fn test_comma_value_becomes_list() {
		let compiled = compile(&descriptor(&[("where__id__in", "1,2,3")]), &FIELDS).unwrap();
		let clause = &compiled.clauses[0];
		assert_eq!(clause.op, FilterOp::In);
		assert_eq!(
			clause.values,
			vec![
				FilterValue::Int(1),
				FilterValue::Int(2),
				FilterValue::Int(3)
			]
		);
	}

	#[test]
	fn test_between_requires_two_values() {
		let compiled = compile(&descriptor(&[("where__id__between", "1,9")]), &FIELDS).unwrap();
		assert_eq!(compiled.clauses[0].values.len(), 2);

		let err = compile(&descriptor(&[("where__id__between", "1,2,3")]), &FIELDS).unwrap_err();
		assert!(matches!(err, QueryError::InvalidValue { .. }));
	}

	#[test]
	fn test_malformed_keys_are_rejected() {
		for key in ["bogus", "where__id__more_than__extra", "filter__id"] {
			let err = compile(&descriptor(&[(key, "1")]), &FIELDS).unwrap_err();
			assert!(
				matches!(err, QueryError::MalformedKey { .. }),
				"{key} should be malformed"
			);
		}
	}

	#[test]
	fn test_unknown_operator_is_config_fault() {
		let err = compile(&descriptor(&[("where__id__sounds_like", "5")]), &FIELDS).unwrap_err();
		assert!(matches!(err, QueryError::UnknownOperator { .. }));
		assert!(!err.is_user_error());
	}

	#[test]
	fn test_unknown_field_is_user_error() {
		let err = compile(&descriptor(&[("where__bogus", "5")]), &FIELDS).unwrap_err();
		assert!(matches!(err, QueryError::UnknownField { .. }));
		assert!(err.is_user_error());
	}

	#[test]
	fn test_typed_value_parsing() {
		let err = compile(&descriptor(&[("where__id", "abc")]), &FIELDS).unwrap_err();
		assert!(matches!(err, QueryError::InvalidValue { .. }));

		let compiled = compile(&descriptor(&[("where__isConfirmed", "true")]), &FIELDS).unwrap();
		assert_eq!(compiled.clauses[0].values, vec![FilterValue::Bool(true)]);
	}

	#[test]
	fn test_order_directive() {
		let compiled = compile(&descriptor(&[("order__createdAt", "ASC")]), &FIELDS).unwrap();
		assert!(compiled.clauses.is_empty());
		assert_eq!(compiled.order.len(), 1);
		assert_eq!(compiled.order[0].1, SortDirection::Asc);
		assert_eq!(compiled.sort_direction(), SortDirection::Asc);

		let err = compile(&descriptor(&[("order__createdAt", "SIDEWAYS")]), &FIELDS).unwrap_err();
		assert!(matches!(err, QueryError::InvalidValue { .. }));
	}

	#[test]
	fn test_default_sort_direction_is_desc() {
		let compiled = compile(&descriptor(&[]), &FIELDS).unwrap();
		assert_eq!(compiled.sort_direction(), SortDirection::Desc);
	}

	#[test]
	fn test_clause_order_is_preserved() {
		let compiled = compile(
			&descriptor(&[
				("where__id__more_than", "1"),
				("where__title__like", "%rust%"),
			]),
			&FIELDS,
		)
		.unwrap();
		assert_eq!(compiled.clauses[0].field.column, "id");
		assert_eq!(compiled.clauses[1].field.column, "title");
	}
}
