// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Dual-mode pagination engine.
//!
//! `page` present on the descriptor selects offset pagination with a total
//! count; otherwise keyset (cursor) pagination with a client-resumable next
//! link. The switch is binary: cursor keys are ignored in page mode and vice
//! versa.
//!
//! Caller-supplied override clauses represent a read scoped to a parent
//! ("comments of post X") and win over client filters on the same field.

use serde::Serialize;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::Sqlite;
use url::Url;

use crate::error::DbError;
use crate::query::descriptor::{QueryDescriptor, CURSOR_LESS_THAN, CURSOR_MORE_THAN};
use crate::query::filter::{
	compile, Clause, CompiledQuery, EntityFields, FilterValue, SortDirection,
};

/// An entity that can be listed through the pagination engine.
///
/// Implementors register their filterable/sortable fields once; the compiler
/// validates every incoming key against that table.
pub trait PagedEntity:
	for<'r> sqlx::FromRow<'r, SqliteRow> + Serialize + Send + Unpin
{
	const TABLE: &'static str;
	const FIELDS: EntityFields;

	fn row_id(&self) -> i64;
}

/// Cursor position of a keyset page.
#[derive(Debug, Clone, Serialize)]
pub struct Cursor {
	pub after: Option<i64>,
}

/// Result envelope of a paginated listing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Paginated<E> {
	Page {
		data: Vec<E>,
		total: i64,
	},
	Cursor {
		data: Vec<E>,
		cursor: Cursor,
		count: usize,
		next: Option<String>,
	},
}

impl<E> Paginated<E> {
	pub fn data(&self) -> &[E] {
		match self {
			Paginated::Page { data, .. } => data,
			Paginated::Cursor { data, .. } => data,
		}
	}
}

/// Run a paginated listing for `E` under the descriptor's compiled filters.
///
/// `path` is the resource path used in next links (e.g. `posts` or
/// `posts/42/comments`); `base_url` is the configured public base URL.
pub async fn paginate<E: PagedEntity>(
	pool: &SqlitePool,
	descriptor: &QueryDescriptor,
	overrides: &[Clause],
	path: &str,
	base_url: &str,
) -> Result<Paginated<E>, DbError> {
	// Fail fast: compile before any query executes.
	let compiled = compile(descriptor, &E::FIELDS)?;
	let clauses = apply_overrides(compiled.clauses.clone(), overrides);
	let (where_sql, binds) = build_where(&clauses);
	let order_sql = build_order(&compiled);

	match descriptor.page() {
		Some(page) => {
			page_paginate::<E>(pool, descriptor, page, &where_sql, &binds, &order_sql).await
		}
		None => {
			cursor_paginate::<E>(
				pool, descriptor, &compiled, &where_sql, &binds, &order_sql, path, base_url,
			)
			.await
		}
	}
}

async fn page_paginate<E: PagedEntity>(
	pool: &SqlitePool,
	descriptor: &QueryDescriptor,
	page: u32,
	where_sql: &str,
	binds: &[FilterValue],
	order_sql: &str,
) -> Result<Paginated<E>, DbError> {
	let take = i64::from(descriptor.take());
	let skip = (i64::from(page) - 1) * take;

	let sql = format!(
		"SELECT * FROM {}{}{} LIMIT ? OFFSET ?",
		E::TABLE,
		where_sql,
		order_sql
	);
	let mut query = sqlx::query_as::<_, E>(&sql);
	for value in binds {
		query = bind_row_value(query, value);
	}
	let data = query.bind(take).bind(skip).fetch_all(pool).await?;

	let count_sql = format!("SELECT COUNT(*) FROM {}{}", E::TABLE, where_sql);
	let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
	for value in binds {
		count_query = bind_scalar_value(count_query, value);
	}
	let total = count_query.fetch_one(pool).await?;

	Ok(Paginated::Page { data, total })
}

#[allow(clippy::too_many_arguments)]
async fn cursor_paginate<E: PagedEntity>(
	pool: &SqlitePool,
	descriptor: &QueryDescriptor,
	compiled: &CompiledQuery,
	where_sql: &str,
	binds: &[FilterValue],
	order_sql: &str,
	path: &str,
	base_url: &str,
) -> Result<Paginated<E>, DbError> {
	let take = i64::from(descriptor.take());

	let sql = format!(
		"SELECT * FROM {}{}{} LIMIT ?",
		E::TABLE,
		where_sql,
		order_sql
	);
	let mut query = sqlx::query_as::<_, E>(&sql);
	for value in binds {
		query = bind_row_value(query, value);
	}
	let data = query.bind(take).fetch_all(pool).await?;

	// The cursor exists only when the page is full; a short page means the
	// iteration is exhausted.
	let after = if data.len() as i64 == take {
		data.last().map(PagedEntity::row_id)
	} else {
		None
	};

	let next = match after {
		Some(last_id) => Some(build_next_link(
			base_url,
			path,
			descriptor,
			compiled.sort_direction(),
			last_id,
		)?),
		None => None,
	};

	Ok(Paginated::Cursor {
		count: data.len(),
		data,
		cursor: Cursor { after },
		next,
	})
}

/// Drop compiled clauses shadowed by an override on the same field, then
/// append the overrides. Overrides always win.
fn apply_overrides(mut clauses: Vec<Clause>, overrides: &[Clause]) -> Vec<Clause> {
	clauses.retain(|clause| {
		!overrides
			.iter()
			.any(|over| over.field.name == clause.field.name)
	});
	clauses.extend(overrides.iter().cloned());
	clauses
}

fn build_where(clauses: &[Clause]) -> (String, Vec<FilterValue>) {
	if clauses.is_empty() {
		return (String::new(), Vec::new());
	}

	let mut parts = Vec::with_capacity(clauses.len());
	let mut binds = Vec::new();

	for clause in clauses {
		let column = clause.field.column;
		match clause.op {
			crate::query::filter::FilterOp::IsNull => {
				parts.push(format!("{column} IS NULL"));
			}
			crate::query::filter::FilterOp::Between => {
				parts.push(format!("{column} BETWEEN ? AND ?"));
				binds.extend(clause.values.iter().cloned());
			}
			crate::query::filter::FilterOp::In => {
				let placeholders = vec!["?"; clause.values.len()].join(", ");
				parts.push(format!("{column} IN ({placeholders})"));
				binds.extend(clause.values.iter().cloned());
			}
			op => {
				parts.push(format!("{column} {} ?", op.sql_comparator()));
				binds.extend(clause.values.iter().cloned());
			}
		}
	}

	(format!(" WHERE {}", parts.join(" AND ")), binds)
}

fn build_order(compiled: &CompiledQuery) -> String {
	let direction = compiled.sort_direction();
	let mut parts: Vec<String> = compiled
		.order
		.iter()
		.map(|(field, dir)| format!("{} {}", field.column, dir.as_sql()))
		.collect();

	if parts.is_empty() {
		parts.push(format!("created_at {}", direction.as_sql()));
	}

	// Stable iteration order: id is always the final tiebreaker.
	if !compiled.order.iter().any(|(field, _)| field.column == "id") {
		parts.push(format!("id {}", direction.as_sql()));
	}

	format!(" ORDER BY {}", parts.join(", "))
}

/// Build the absolute next-page URL: every non-empty descriptor field except
/// the cursor keys, plus exactly one cursor key pointing past the last row.
/// ASC walks forward with `more_than`, DESC walks backward with `less_than`,
/// so "next" always moves away from the already-seen set.
fn build_next_link(
	base_url: &str,
	path: &str,
	descriptor: &QueryDescriptor,
	direction: SortDirection,
	last_id: i64,
) -> Result<String, DbError> {
	let mut url = Url::parse(base_url)
		.map_err(|e| DbError::Internal(format!("invalid public base URL {base_url}: {e}")))?;
	url.set_path(path);

	{
		let mut query_pairs = url.query_pairs_mut();
		for (key, value) in descriptor.link_params() {
			query_pairs.append_pair(&key, &value);
		}
		let cursor_key = match direction {
			SortDirection::Asc => CURSOR_MORE_THAN,
			SortDirection::Desc => CURSOR_LESS_THAN,
		};
		query_pairs.append_pair(cursor_key, &last_id.to_string());
	}

	Ok(url.to_string())
}

fn bind_row_value<'q, E>(
	query: QueryAs<'q, Sqlite, E, SqliteArguments<'q>>,
	value: &FilterValue,
) -> QueryAs<'q, Sqlite, E, SqliteArguments<'q>> {
	match value {
		FilterValue::Int(v) => query.bind(*v),
		FilterValue::Bool(v) => query.bind(*v),
		FilterValue::Text(v) => query.bind(v.clone()),
	}
}

fn bind_scalar_value<'q>(
	query: QueryScalar<'q, Sqlite, i64, SqliteArguments<'q>>,
	value: &FilterValue,
) -> QueryScalar<'q, Sqlite, i64, SqliteArguments<'q>> {
	match value {
		FilterValue::Int(v) => query.bind(*v),
		FilterValue::Bool(v) => query.bind(*v),
		FilterValue::Text(v) => query.bind(v.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::post::Post;
	use crate::testing::{create_test_pool, seed_post, seed_user};

	const BASE_URL: &str = "http://localhost:3000";

	fn descriptor(pairs: &[(&str, &str)]) -> QueryDescriptor {
		QueryDescriptor::from_pairs(
			pairs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string())),
		)
		.unwrap()
	}

	async fn seed_posts(pool: &SqlitePool, n: usize) -> i64 {
		let author = seed_user(pool, "author").await;
		for i in 1..=n {
			seed_post(pool, author, &format!("post {i}"), "content").await;
		}
		author
	}

	fn query_pairs_of(link: &str) -> Vec<(String, String)> {
		Url::parse(link)
			.unwrap()
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect()
	}

	#[tokio::test]
	async fn test_page_mode_returns_total() {
		let pool = create_test_pool().await;
		seed_posts(&pool, 25).await;

		let result = paginate::<Post>(
			&pool,
			&descriptor(&[("page", "2"), ("take", "10")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		match result {
			Paginated::Page { data, total } => {
				assert_eq!(data.len(), 10);
				assert_eq!(total, 25);
			}
			Paginated::Cursor { .. } => panic!("expected page mode"),
		}
	}

	#[tokio::test]
	async fn test_page_mode_wins_over_cursor_fields() {
		let pool = create_test_pool().await;
		seed_posts(&pool, 5).await;

		// Both page and a cursor key supplied: page mode takes precedence and
		// the cursor key still applies as an ordinary filter.
		let result = paginate::<Post>(
			&pool,
			&descriptor(&[("page", "1"), ("where__id__more_than", "2")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		match result {
			Paginated::Page { data, total } => {
				assert_eq!(total, 3);
				assert!(data.iter().all(|p| p.id > 2));
			}
			Paginated::Cursor { .. } => panic!("page must win over cursor fields"),
		}
	}

	#[tokio::test]
	async fn test_cursor_full_page_emits_cursor_and_link() {
		let pool = create_test_pool().await;
		seed_posts(&pool, 10).await;

		let result = paginate::<Post>(
			&pool,
			&descriptor(&[("take", "10")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		match result {
			Paginated::Cursor {
				data,
				cursor,
				count,
				next,
			} => {
				assert_eq!(count, 10);
				assert_eq!(cursor.after, Some(data.last().unwrap().id));
				assert!(next.is_some());
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		}
	}

	#[tokio::test]
	async fn test_cursor_short_page_has_no_link() {
		let pool = create_test_pool().await;
		seed_posts(&pool, 3).await;

		let result = paginate::<Post>(
			&pool,
			&descriptor(&[("take", "10")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		match result {
			Paginated::Cursor {
				cursor,
				count,
				next,
				..
			} => {
				assert_eq!(count, 3);
				assert_eq!(cursor.after, None);
				assert_eq!(next, None);
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		}
	}

	#[tokio::test]
	async fn test_cursor_empty_result() {
		let pool = create_test_pool().await;

		let result =
			paginate::<Post>(&pool, &descriptor(&[]), &[], "posts", BASE_URL)
				.await
				.unwrap();

		match result {
			Paginated::Cursor {
				data,
				cursor,
				count,
				next,
			} => {
				assert!(data.is_empty());
				assert_eq!(count, 0);
				assert_eq!(cursor.after, None);
				assert_eq!(next, None);
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		}
	}

	#[tokio::test]
	async fn test_cursor_walk_desc_is_strictly_decreasing() {
		let pool = create_test_pool().await;
		seed_posts(&pool, 12).await;

		let first = paginate::<Post>(
			&pool,
			&descriptor(&[("take", "5"), ("order__createdAt", "DESC")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		let (first_last_id, next) = match first {
			Paginated::Cursor { data, next, .. } => {
				(data.last().unwrap().id, next.unwrap())
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		};

		let follow = QueryDescriptor::from_pairs(query_pairs_of(&next)).unwrap();
		let second = paginate::<Post>(&pool, &follow, &[], "posts", BASE_URL)
			.await
			.unwrap();

		match second {
			Paginated::Cursor { data, .. } => {
				assert!(!data.is_empty());
				assert!(data.first().unwrap().id < first_last_id);
				// strictly decreasing within the page too
				for pair in data.windows(2) {
					assert!(pair[0].id > pair[1].id);
				}
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		}
	}

	#[tokio::test]
	async fn test_cursor_walk_asc_is_strictly_increasing() {
		let pool = create_test_pool().await;
		seed_posts(&pool, 12).await;

		let first = paginate::<Post>(
			&pool,
			&descriptor(&[("take", "5"), ("order__createdAt", "ASC")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		let (first_last_id, next) = match first {
			Paginated::Cursor { data, next, .. } => {
				(data.last().unwrap().id, next.unwrap())
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		};

		assert!(next.contains("where__id__more_than"));

		let follow = QueryDescriptor::from_pairs(query_pairs_of(&next)).unwrap();
		let second = paginate::<Post>(&pool, &follow, &[], "posts", BASE_URL)
			.await
			.unwrap();

		match second {
			Paginated::Cursor { data, .. } => {
				assert!(data.first().unwrap().id > first_last_id);
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		}
	}

	#[tokio::test]
	async fn test_next_link_preserves_descriptor_fields() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "author").await;
		for i in 1..=10 {
			seed_post(&pool, author, &format!("foo {i}"), "content").await;
		}

		let result = paginate::<Post>(
			&pool,
			&descriptor(&[
				("order__createdAt", "ASC"),
				("take", "10"),
				("where__title__like", "foo%"),
			]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		let next = match result {
			Paginated::Cursor { next, data, .. } => {
				assert_eq!(data.len(), 10);
				next.unwrap()
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		};

		let params = query_pairs_of(&next);
		assert!(params.contains(&("order__createdAt".to_string(), "ASC".to_string())));
		assert!(params.contains(&("take".to_string(), "10".to_string())));
		assert!(params.contains(&("where__title__like".to_string(), "foo%".to_string())));
		assert!(params
			.iter()
			.any(|(k, v)| k == "where__id__more_than" && v == "10"));
		assert!(!params.iter().any(|(k, _)| k == "where__id__less_than"));
	}

	#[tokio::test]
	async fn test_override_constraints_win() {
		let pool = create_test_pool().await;
		let author = seed_user(&pool, "author").await;
		let other = seed_user(&pool, "other").await;
		for _ in 0..3 {
			seed_post(&pool, author, "mine", "content").await;
		}
		seed_post(&pool, other, "theirs", "content").await;

		// The client tries to read someone else's rows; the override pins the
		// scope to `author`.
		let scope = Post::FIELDS
			.equals("authorId", FilterValue::Int(author))
			.unwrap();
		let other_id = other.to_string();
		let result = paginate::<Post>(
			&pool,
			&descriptor(&[("where__authorId", other_id.as_str())]),
			&[scope],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap();

		match result {
			Paginated::Cursor { data, count, .. } => {
				assert_eq!(count, 3);
				assert!(data.iter().all(|p| p.author_id == author));
			}
			Paginated::Page { .. } => panic!("expected cursor mode"),
		}
	}

	#[tokio::test]
	async fn test_compile_failure_reports_before_query() {
		let pool = create_test_pool().await;

		let err = paginate::<Post>(
			&pool,
			&descriptor(&[("where__nope__more_than__wat", "1")]),
			&[],
			"posts",
			BASE_URL,
		)
		.await
		.unwrap_err();

		assert!(matches!(err, DbError::Query(_)));
	}
}
