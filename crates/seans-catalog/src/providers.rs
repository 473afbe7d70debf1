/// A third-party embed player and its URL templates.
#[derive(Debug, Clone, Copy)]
pub struct EmbedProvider {
    pub id: &'static str,
    pub name: &'static str,
    movie: &'static str,
    tv: &'static str,
}

/// `{id}`, `{season}` and `{episode}` are substituted.
pub const EMBED_PROVIDERS: &[EmbedProvider] = &[
    EmbedProvider {
        id: "vidsrc",
        name: "VidSrc",
        movie: "https://vidsrc.cc/v2/embed/movie/{id}",
        tv: "https://vidsrc.cc/v2/embed/tv/{id}/{season}/{episode}",
    },
    EmbedProvider {
        id: "GodDrive",
        name: "GodDrive",
        movie: "https://godriveplayer.com/player.php?imdb={id}",
        tv: "https://godriveplayer.com/player.php?imdb={id}&s={season}&e={episode}",
    },
    EmbedProvider {
        id: "vidlink",
        name: "VidLink",
        movie: "https://vidlink.pro/movie/{id}",
        tv: "https://vidlink.pro/tv/{id}/{season}/{episode}",
    },
];

pub fn find_provider(id: &str) -> Option<&'static EmbedProvider> {
    EMBED_PROVIDERS.iter().find(|p| p.id == id)
}

impl EmbedProvider {
    pub fn movie_url(&self, external_id: &str) -> String {
        self.movie.replace("{id}", external_id)
    }

    pub fn tv_url(&self, external_id: &str, season: u32, episode: u32) -> String {
        self.tv
            .replace("{id}", external_id)
            .replace("{season}", &season.to_string())
            .replace("{episode}", &episode.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_templates() {
        let vidsrc = find_provider("vidsrc").unwrap();
        assert_eq!(vidsrc.movie_url("550"), "https://vidsrc.cc/v2/embed/movie/550");
        assert_eq!(vidsrc.tv_url("1399", 2, 5), "https://vidsrc.cc/v2/embed/tv/1399/2/5");

        let goddrive = find_provider("GodDrive").unwrap();
        assert_eq!(
            goddrive.tv_url("tt0944947", 1, 3),
            "https://godriveplayer.com/player.php?imdb=tt0944947&s=1&e=3"
        );
        assert!(find_provider("unknown").is_none());
    }
}
