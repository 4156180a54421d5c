//! URL handling module for Site-Mirror
//!
//! This module provides URL canonicalization, reference resolution, netloc
//! extraction, and the domain policy that decides which links are followed.

mod domain;
mod normalize;
mod policy;

pub use domain::extract_netloc;
pub use normalize::{canonicalize_url, resolve_reference, validate_seed_url};
pub use policy::{classify_link, DomainPolicy, LinkClass};
