//! Plantatlas: location dataset fusion and map scene assembly
//!
//! This crate ingests several heterogeneous location datasets (steel plants, steel plants
//! with blast furnaces, geocoded companies and rice mills), cleans their coordinates,
//! fuses them into one typed dataset and prepares everything a map frontend needs:
//!
//! 1. **Load Pass** -- Read each raw CSV (optionally in chunks), resolve the source's
//!    coordinate columns, normalize them to decimal degrees and drop invalid rows into
//!    an audit dataset
//! 2. **Normalize Pass** -- Give every source canonical `state`/`district` columns plus
//!    their legacy-cased mirrors, deriving districts from addresses where needed
//! 3. **Fusion Pass** -- Stack the sources into one dataset and compact it (narrow
//!    integers, dictionary-encode repetitive numeric-looking text)
//! 4. **Query Pass** -- Filter, paginate and summarize the fused dataset, then compose a
//!    serializable scene with point traces and GeoJSON overlay layers
//!
//! # Architecture
//!
//! - **Columnar datasets** -- Immutable `Arc`-shared columns; every transform is
//!   copy-on-write
//! - **Alias tables** -- One static table per source names its header spellings
//! - **Ordered rule table** -- Coarse region classification, first matching rectangle wins
//! - **Injected caching** -- Loads are memoized behind [`cache::DatasetCache`], keyed by
//!   input path, chunk size, mtime and size
//! - **Total operations** -- Bad rows and bad features are dropped and counted, never fatal
//!
//! # Key Modules
//!
//! - [`dataset`] -- Columnar `Dataset`, typed cells and column storage
//! - [`coord`] -- Coordinate parsing (decimal, sexagesimal) and range checks
//! - [`reader`] -- Batched row readers over CSV or in-memory rows
//! - [`source`] -- Per-source alias tables and the coordinate-cleaning adapter
//! - [`schema`] -- Canonical state/district columns and legacy mirrors
//! - [`fusion`] -- Concatenation and memory compaction
//! - [`filter`] -- Compound filters with whole-word token matching
//! - [`paginate`] / [`session`] -- Page slicing and per-source page state
//! - [`geometry`] -- GeoJSON geometry decoding and outer-ring centroids
//! - [`region`] -- Coarse state/district classification and GeoJSON enrichment
//! - [`overlay`] -- GeoJSON overlay layers with feature truncation
//! - [`scene`] -- Map scene descriptor
//! - [`metadata`] -- Overlay descriptive metadata
//! - [`summary`] -- Per-source statistics
//! - [`pipeline`] -- Load, normalize and fuse end to end
//! - [`cache`] -- Load memoization keyed by input metadata
//! - [`stats`] -- Load counters
//! - [`config`] -- Constants and pipeline configuration
//!
//! # Example Usage
//!
//! ```no_run
//! use plantatlas::cache::MemoryCache;
//! use plantatlas::config::PipelineConfig;
//! use plantatlas::filter::{apply_filters, FilterSet};
//! use plantatlas::models::SourceType;
//! use plantatlas::pipeline::load_and_merge;
//! use plantatlas::scene::compose;
//!
//! let config = PipelineConfig::default();
//! let mut cache = MemoryCache::new();
//! let output = load_and_merge(&config, &SourceType::ALL, &mut cache)?;
//! let filters = FilterSet {
//!     name: Some("Tata".into()),
//!     ..FilterSet::default()
//! };
//! let visible = apply_filters(&output.dataset, &filters)?;
//! let scene = compose(&visible, Vec::new());
//! println!("{}", scene.to_json()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod dataset;
pub mod filter;
pub mod fusion;
pub mod geometry;
pub mod metadata;
pub mod models;
pub mod overlay;
pub mod paginate;
pub mod pipeline;
pub mod reader;
pub mod region;
pub mod scene;
pub mod schema;
pub mod session;
pub mod source;
pub mod stats;
pub mod summary;
