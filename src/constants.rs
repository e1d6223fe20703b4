pub mod provider {

    pub const TMDB_API: &str = "https://api.themoviedb.org/3";

    pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

    /// Cast lists are trimmed to this many members before they are stored.
    pub const MAX_CAST_MEMBERS: usize = 12;

    /// Artwork language preferred when picking logos and backdrops.
    pub const LOGO_LANGUAGE: &str = "en";
}

pub mod pacing {

    /// Default delay between two batch units, in milliseconds.
    pub const DEFAULT_PACING_MS: u64 = 250;

    pub const DEFAULT_BURST: u32 = 1;
}

pub mod trash {

    pub const DEFAULT_RETENTION_DAYS: u32 = 30;

    pub const SNAPSHOT_EXTENSION: &str = "json";
}

pub mod session {

    pub const DEFAULT_DRAFT_TTL_SECS: u64 = 30 * 60;
}

pub mod limits {

    pub const MAX_SEARCH_RESULTS: usize = 40;
}
