/// Required feature an extension package must declare in `uses_features`
pub const EXTENSION_FEATURE: &str = "tachiyomi.extension";

/// Lowest extension library version the host accepts (inclusive)
pub const LIB_VERSION_MIN: f64 = 1.1;

/// Highest extension library version the host accepts (inclusive)
pub const LIB_VERSION_MAX: f64 = 1.5;

/// Manifest metadata key naming the entry-point class
pub const METADATA_SOURCE_CLASS: &str = "tachiyomi.extension.class";

/// Manifest metadata key flagging the whole package as NSFW ("1" means NSFW)
pub const METADATA_NSFW: &str = "tachiyomi.extension.nsfw";

/// Simple name of the annotation marking a source (or factory) as NSFW
pub const NSFW_MARKER: &str = "Nsfw";

/// Path of the manifest inside a package archive
pub const PACKAGE_MANIFEST: &str = "manifest.json";

/// Directory inside a package archive holding per-platform native payloads
pub const PAYLOAD_ROOT: &str = "lib";

/// Prefix of the exported constructor symbol for an entry-point class
pub const ENTRY_SYMBOL_PREFIX: &str = "bindery_new_";
