//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, shorten fully
//! qualified type names, and rank "did you mean?" suggestions.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use bindery_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "Database", "UserService"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "UserService → UserRepo → Database → UserService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display by dropping module
/// paths while keeping the generic structure intact.
///
/// ```
/// use bindery_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment_start = 0;

    for (i, ch) in full_name.char_indices() {
        if matches!(ch, '<' | '>' | ',' | ' ' | '&' | '(' | ')') {
            out.push_str(last_path_segment(&full_name[segment_start..i]));
            out.push(ch);
            segment_start = i + ch.len_utf8();
        }
    }
    out.push_str(last_path_segment(&full_name[segment_start..]));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Ranks "did you mean?" suggestions for an unresolved type name.
///
/// Compares the requested type name against the names that ARE
/// registered and returns the closest matches, best first. Full-name
/// containment outranks short-name containment, which outranks a mere
/// shared prefix.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let want = requested.to_ascii_lowercase();
    let want_short = shorten_type_name(requested).to_ascii_lowercase();

    let mut ranked: Vec<(u8, &str)> = available
        .iter()
        .filter_map(|&candidate| {
            let have = candidate.to_ascii_lowercase();
            let have_short = shorten_type_name(candidate).to_ascii_lowercase();

            let score = if have.contains(&want) || want.contains(&have) {
                3
            } else if have_short.contains(&want_short) || want_short.contains(&have_short) {
                2
            } else if shared_prefix_len(&have_short, &want_short) >= 4 {
                1
            } else {
                return None;
            };
            Some((score, candidate))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_simple_chain() {
        let chain = vec!["A", "B", "C", "A"];
        assert_eq!(render_chain(&chain), "A → B → C → A");
    }

    #[test]
    fn render_single_element_chain() {
        let chain = vec!["A"];
        assert_eq!(render_chain(&chain), "A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_simple_path() {
        assert_eq!(
            shorten_type_name("my_app::services::UserService"),
            "UserService"
        );
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
            "Arc<dyn Logger>"
        );
    }

    #[test]
    fn shorten_nested_generics() {
        assert_eq!(
            shorten_type_name("std::collections::HashMap<alloc::string::String, my_app::User>"),
            "HashMap<String, User>"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn suggest_similar_types() {
        let available = vec![
            "my_app::UserService",
            "my_app::UserRepository",
            "my_app::Logger",
            "my_app::Database",
        ];

        let suggestions = suggest_similar("UserServise", &available, 3);
        assert!(!suggestions.is_empty());
        assert!(suggestions[0].contains("UserService"));
    }

    #[test]
    fn suggest_ranks_containment_over_prefix() {
        let available = vec!["my_app::DataMapper", "db::Database"];

        let suggestions = suggest_similar("Database", &available, 2);
        // Containment outranks the shared "data" prefix.
        assert_eq!(suggestions[0], "db::Database");
        assert_eq!(suggestions[1], "my_app::DataMapper");
    }

    #[test]
    fn suggest_no_match() {
        let available = vec!["my_app::Database"];
        let suggestions = suggest_similar("XyzAbcDef", &available, 3);
        assert!(suggestions.is_empty());
    }
}
