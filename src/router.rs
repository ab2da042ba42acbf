//! Hash-fragment routing between page sections.
//!
//! ```text
//! #blog/<postId>   → Route::BlogPost(postId)
//! #<section>       → Route::Section(section)   for a known section
//! anything else    → Route::Section(Home)
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Home,
    Portfolio,
    Blog,
    About,
    Contacts,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Home,
        Section::Portfolio,
        Section::Blog,
        Section::About,
        Section::Contacts,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::Portfolio => "portfolio",
            Section::Blog => "blog",
            Section::About => "about",
            Section::Contacts => "contacts",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.slug() == slug)
    }

    /// Capitalized slug, used in the document title.
    pub fn label(self) -> String {
        let slug = self.slug();
        let mut chars = slug.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Section(Section),
    BlogPost(String),
}

impl Default for Route {
    fn default() -> Self {
        Route::Section(Section::Home)
    }
}

impl Route {
    /// Parse a location fragment, with or without the leading `#`.
    pub fn parse(fragment: &str) -> Route {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if let Some(id) = fragment.strip_prefix("blog/") {
            // Only the first path segment names the post
            let id = id.split('/').next().unwrap_or_default();
            if !id.is_empty() {
                return Route::BlogPost(id.to_string());
            }
            return Route::Section(Section::Blog);
        }
        Section::from_slug(fragment)
            .map(Route::Section)
            .unwrap_or_default()
    }

    pub fn to_fragment(&self) -> String {
        self.to_string()
    }

    /// The section whose content is shown for this route.
    pub fn section(&self) -> Section {
        match self {
            Route::Section(section) => *section,
            Route::BlogPost(_) => Section::Blog,
        }
    }

    /// Document title: the site name alone on the home section, otherwise
    /// `site | Section`.
    pub fn title(&self, site: &str) -> String {
        match self.section() {
            Section::Home => site.to_string(),
            section => format!("{site} | {}", section.label()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Section(section) => write!(f, "#{}", section.slug()),
            Route::BlogPost(id) => write!(f, "#blog/{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blog_post() {
        assert_eq!(Route::parse("#blog/p7"), Route::BlogPost("p7".into()));
        assert_eq!(Route::parse("blog/p7/extra"), Route::BlogPost("p7".into()));
    }

    #[test]
    fn parses_known_sections() {
        for section in Section::ALL {
            let fragment = format!("#{}", section.slug());
            assert_eq!(Route::parse(&fragment), Route::Section(section));
        }
    }

    #[test]
    fn empty_blog_post_id_is_blog_section() {
        assert_eq!(Route::parse("#blog/"), Route::Section(Section::Blog));
    }

    #[test]
    fn unknown_or_missing_falls_back_to_home() {
        assert_eq!(Route::parse(""), Route::default());
        assert_eq!(Route::parse("#"), Route::default());
        assert_eq!(Route::parse("#gallery"), Route::Section(Section::Home));
    }

    #[test]
    fn fragment_renders_back() {
        assert_eq!(Route::BlogPost("p7".into()).to_fragment(), "#blog/p7");
        assert_eq!(Route::Section(Section::Contacts).to_fragment(), "#contacts");
        let route = Route::parse("#portfolio");
        assert_eq!(Route::parse(&route.to_fragment()), route);
    }

    #[test]
    fn titles() {
        assert_eq!(Route::default().title("LC"), "LC");
        assert_eq!(Route::parse("#about").title("LC"), "LC | About");
        assert_eq!(Route::parse("#blog/p1").title("LC"), "LC | Blog");
    }
}
