/*!
# SuiReN

A speed reading practice application for learners of Japanese, built in Rust.

## Overview

SuiReN (速読ゴリラ) serves reading passages graded into difficulty levels,
asks comprehension questions after each reading, and turns the outcome into a
shareable result: reading speed, accuracy, a per-line reading pace analysis
and a QR code that carries the result to another device. Staff manage the
passage library, levels and labels through an authenticated admin API, with
Excel workbooks as the bulk authoring format.

## Architecture

The application follows a client-server architecture:

### API Layer
- **Technologies**: Rust, axum, tower-http
- **Key Components**:
  - Public Routes - Passage listings, levels, labels, site pages, results
  - Admin Routes - Passage/level/label CRUD behind a session cookie
  - Excel Routes - Template download, workbook upload, passage export
  - Result Routes - Submission, token reconstruction, QR rendering

### Domain Layer
- **Core Components**:
  - Library Store - In-memory passage/level/label records with ordering
  - Speed Scorer - Characters-per-minute statistics with level targets
  - Scroll Analyzer - Per-line view times from scroll samples
  - Ruby Parser - 《》/（） reading annotations split into base and ruby
  - Result Codec - Compact URL-safe result tokens

### Data Persistence Layer
- File storage with Gzip compression and bincode serialization
- A single snapshot file holding the whole library
- Excel (.xlsx) import/export for passage authoring

## Key Features

- Reading passages with inline images, ruby annotations and thumbnails
- Comprehension questions with 2 to 6 options and per-question explanations
- Reading speed scoring against per-level target speeds
- Scroll tracking and per-line view time analysis with a pace chart
- QR-coded shareable result links that need no server-side result storage
- Level and label management with manual passage ordering
- Excel template/upload/export workflow for bulk authoring
- Admin session management with Argon2 password hashing

## Modules

- **analyzer**: Per-line view times and text segments from scroll samples
- **app**: Routing, handlers and middleware
- **config**: Environment-driven runtime configuration
- **content**: Passage, question, level, label and site page records
- **downloader**: Excel template and passage export workbooks
- **graph**: Reading pace chart rendering
- **loader**: Excel workbook parsing into importable passages
- **login**: Admin password hashing and session management
- **qr**: Result QR code generation
- **result**: Result records, URL-safe tokens and reconstruction
- **ruby**: Ruby annotation parsing
- **saving**: Library persistence with compression
- **speed**: Character/word counting and reading speed statistics
- **store**: The in-memory library and its editing operations
- **text**: Passage text cleanup shared by counting and analysis
- **tracker**: Scroll sample recording types

## REST API Endpoints

- `/api/contents` - Passage listing and creation
- `/api/contents/{id}` - Single passage read/update/delete
- `/api/contents/{id}/order`, `/api/contents/batch-order` - Manual ordering
- `/api/contents/{id}/labels` - Label attachment
- `/api/levels`, `/api/levels/{id}`, `/api/levels/{id}/set-default` - Levels
- `/api/labels`, `/api/labels/{id}` - Labels
- `/api/about`, `/api/site-info` - Site pages
- `/api/results`, `/api/results/{token}`, `/api/results/{token}/qr` - Results
- `/api/admin/login`, `/api/admin/logout`, `/api/admin/session` - Sessions
- `/api/excel/template`, `/api/excel/upload`, `/api/excel/export/{id}` - Excel
*/

// Re-export all modules so they appear in the documentation
pub mod analyzer;
pub mod app;
pub mod config;
pub mod content;
pub mod downloader;
pub mod graph;
pub mod loader;
pub mod login;
pub mod qr;
pub mod result;
pub mod ruby;
pub mod saving;
pub mod speed;
pub mod store;
pub mod text;
pub mod tracker;

/// Re-export everything from these modules to make it easier to use
pub use analyzer::*;
pub use app::*;
pub use config::*;
pub use content::*;
pub use downloader::*;
pub use graph::*;
pub use loader::*;
pub use login::*;
pub use qr::*;
pub use result::*;
pub use ruby::*;
pub use saving::*;
pub use speed::*;
pub use store::*;
pub use text::*;
pub use tracker::*;
