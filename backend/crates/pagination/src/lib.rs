//! Opaque cursor and page envelope primitives.
//!
//! Endpoints that return ranked collections hand clients an opaque cursor
//! instead of numeric offsets. The cursor wraps whatever ordering key the
//! caller chooses, serialized as JSON and encoded with URL-safe base64, so
//! clients cannot depend on its structure.
//!
//! ```
//! use pagination::{Cursor, Page, PageParams};
//!
//! let params = PageParams::new(None, Some(2), 20, 100);
//! let ranked = vec![10_u32, 20, 30];
//! let page = Page::from_window(ranked, params.limit(), |item| *item).expect("page");
//!
//! assert_eq!(page.items(), &[10, 20]);
//! let cursor: Cursor<u32> = Cursor::decode(page.next_cursor().expect("more")).expect("cursor");
//! assert_eq!(*cursor.key(), 20);
//! ```

mod cursor;
mod page;

pub use cursor::{Cursor, CursorError};
pub use page::{Page, PageParams};
