// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Parsed form of a client's list request.
//!
//! The wire format is a flat key/value map: reserved keys `page` and `take`,
//! plus any number of `where__*` / `order__*` filter keys. The filter keys
//! are kept verbatim, in arrival order, both for compilation and for
//! reconstructing the next-page link.

use crate::query::filter::QueryError;

/// Reserved cursor keys. These are ordinary filter keys to the compiler, but
/// the pagination engine strips them when building the next link and appends
/// exactly one of them pointing at the resumption row.
pub const CURSOR_MORE_THAN: &str = "where__id__more_than";
pub const CURSOR_LESS_THAN: &str = "where__id__less_than";

const DEFAULT_TAKE: u32 = 20;

/// The parsed form of a client's list request.
///
/// `page` and the cursor keys are mutually exclusive in intended use; when
/// both arrive, page mode wins (engine policy, not a validation error).
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
	page: Option<u32>,
	take: u32,
	raw: Vec<(String, String)>,
}

impl QueryDescriptor {
	/// Parse the flat query-string pairs.
	///
	/// `page` and `take` must be positive integers; every other key is kept
	/// as-is for the compiler, which validates its shape before any query
	/// runs.
	pub fn from_pairs(
		pairs: impl IntoIterator<Item = (String, String)>,
	) -> Result<Self, QueryError> {
		let mut page = None;
		let mut take = DEFAULT_TAKE;
		let mut raw = Vec::new();

		for (key, value) in pairs {
			match key.as_str() {
				"page" => {
					page = Some(parse_positive(&key, &value)?);
				}
				"take" => {
					take = parse_positive(&key, &value)?;
				}
				_ => raw.push((key, value)),
			}
		}

		Ok(Self { page, take, raw })
	}

	pub fn page(&self) -> Option<u32> {
		self.page
	}

	pub fn take(&self) -> u32 {
		self.take
	}

	/// Clamp the page size to `max`. The engine itself trusts the descriptor;
	/// callers apply their own bound.
	pub fn clamp_take(&mut self, max: u32) {
		self.take = self.take.min(max).max(1);
	}

	/// The raw filter/order pairs, in arrival order.
	pub fn filters(&self) -> &[(String, String)] {
		&self.raw
	}

	/// The descriptor fields to copy into a next-page link: every non-empty
	/// pair except the two cursor keys, plus the effective `take`.
	pub fn link_params(&self) -> Vec<(String, String)> {
		let mut params: Vec<(String, String)> = self
			.raw
			.iter()
			.filter(|(key, value)| {
				!value.is_empty() && key != CURSOR_MORE_THAN && key != CURSOR_LESS_THAN
			})
			.cloned()
			.collect();
		params.push(("take".to_string(), self.take.to_string()));
		params
	}
}

fn parse_positive(key: &str, value: &str) -> Result<u32, QueryError> {
	value
		.parse::<u32>()
		.ok()
		.filter(|n| *n > 0)
		.ok_or_else(|| QueryError::InvalidParam {
			key: key.to_string(),
			value: value.to_string(),
		})
}
