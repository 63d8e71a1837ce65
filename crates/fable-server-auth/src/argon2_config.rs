// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Argon2 configuration for password hashing.
//!
//! Production builds use Argon2id with the library's strong defaults. Tests
//! use intentionally weak parameters so the suite stays fast; those
//! parameters MUST NOT be used in production.

use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};

/// Returns an Argon2 instance configured appropriately for the build context.
#[inline]
pub(crate) fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		// Fast, insecure parameters for tests ONLY.
		let params = Params::new(
			1024, // memory_kib: 1 MiB
			1,    // iterations
			1,    // parallelism
			None, // output length = default
		)
		.expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}
