//! # Docze Core
//!
//! The context-retrieval engine behind Docze, free of database drivers and
//! HTTP clients. Everything that talks to the outside world is expressed as a
//! trait ([`store::Store`], [`embedding::Embedder`],
//! [`completion::Completer`], [`geo::Geolocator`]) so the application crate
//! and the test suite can plug in their own implementations.
//!
//! ## Pipeline
//!
//! ```text
//! query ──▶ resolve ──▶ rank ──▶ assemble ──▶ RetrievalResult
//!             │           │          ▲
//!        recent turns  doc chunks  metadata + location
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Chat turns, document chunks, file metadata, retrieval results |
//! | [`embedding`] | `Embedder` trait, blob codec, cosine similarity |
//! | [`completion`] | `Completer` trait |
//! | [`geo`] | `Geolocator` trait and location info |
//! | [`rank`] | Brute-force top-K similarity ranking |
//! | [`resolve`] | Pronoun resolution against the latest turn |
//! | [`assemble`] | Prompt assembly |
//! | [`retrieve`] | Retrieval orchestrator |
//! | [`chat`] | Ask flow: retrieve, answer, persist both turns |
//! | [`chunk`] | Paragraph-boundary text chunker |
//! | [`store`] | Storage trait and in-memory backend |

pub mod assemble;
pub mod chat;
pub mod chunk;
pub mod completion;
pub mod embedding;
pub mod geo;
pub mod models;
pub mod rank;
pub mod resolve;
pub mod retrieve;
pub mod store;
