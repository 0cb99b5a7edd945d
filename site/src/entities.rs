//! Normalization schemas for the WordPress REST resources the site reads.
//!
//! Relations are declared on the recased field names. WordPress returns
//! related records as bare ids unless `_embed` is requested; both shapes
//! normalize to the same tables.

use press_api::schema::{EntitySchema, Schema};
use std::sync::LazyLock;

/// Entity table names
pub mod kinds {
    /// Pages table
    pub const PAGES: &str = "pages";
    /// Posts table
    pub const POSTS: &str = "posts";
    /// Media attachments table
    pub const MEDIA: &str = "media";
    /// Authors table
    pub const USERS: &str = "users";
}

/// An author
pub static USER: LazyLock<Schema> = LazyLock::new(|| Schema::entity(EntitySchema::new(kinds::USERS)));

/// A media attachment
pub static MEDIA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::entity(EntitySchema::new(kinds::MEDIA).define("author", USER.clone()))
});

/// A list of media attachments
pub static MEDIA_ARRAY: LazyLock<Schema> = LazyLock::new(|| Schema::array(MEDIA.clone()));

/// A page
pub static PAGE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::entity(
        EntitySchema::new(kinds::PAGES)
            .define("author", USER.clone())
            .define("featuredMedia", MEDIA.clone()),
    )
});

/// A post
pub static POST: LazyLock<Schema> = LazyLock::new(|| {
    Schema::entity(
        EntitySchema::new(kinds::POSTS)
            .define("author", USER.clone())
            .define("featuredMedia", MEDIA.clone()),
    )
});

/// A list of posts
pub static POST_ARRAY: LazyLock<Schema> = LazyLock::new(|| Schema::array(POST.clone()));
