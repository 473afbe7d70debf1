use crate::models::ApiConfiguration;

pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/500x750";
pub const DEFAULT_SIZE: &str = "w500";

/// Full image URL for `path` at `size`. Sizes the configuration does not
/// list for posters or backdrops fall back to `original`.
pub fn image_url(config: &ApiConfiguration, path: Option<&str>, size: &str) -> String {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return PLACEHOLDER_IMAGE.to_string();
    };

    let images = &config.images;
    let known = images
        .poster_sizes
        .iter()
        .chain(&images.backdrop_sizes)
        .any(|s| s == size);
    let size = if known { size } else { "original" };

    format!("{}{}{}", images.secure_base_url, size, path)
}
