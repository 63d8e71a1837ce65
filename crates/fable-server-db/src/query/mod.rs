// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Generic query/pagination engine.
//!
//! `descriptor` parses the wire format, `filter` compiles it into typed
//! predicates against a registered field table, and `paginate` executes
//! either offset or keyset retrieval and shapes the response envelope.

pub mod descriptor;
pub mod filter;
pub mod paginate;

pub use descriptor::{QueryDescriptor, CURSOR_LESS_THAN, CURSOR_MORE_THAN};
pub use filter::{
	compile, Clause, CompiledQuery, EntityFields, FieldDef, FieldKind, FilterOp, FilterValue,
	QueryError, SortDirection,
};
pub use paginate::{paginate, Cursor, PagedEntity, Paginated};
