/// Values substituted into response templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    /// Comment text after the trigger, trimmed
    pub user_input: String,
    /// Display name of the commenter
    pub username: String,
}

impl Bindings {
    pub fn new(user_input: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            username: username.into(),
        }
    }
}

pub const USER_INPUT_PLACEHOLDER: &str = "{userinput}";
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Replace `{userinput}` and `{username}` in a template
///
/// Plain substring replacement, `{userinput}` first. Unknown placeholders are
/// left untouched.
pub fn render(template: &str, bindings: &Bindings) -> String {
    template
        .replace(USER_INPUT_PLACEHOLDER, &bindings.user_input)
        .replace(USERNAME_PLACEHOLDER, &bindings.username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_username() {
        let bindings = Bindings::new("", "x");
        assert_eq!(render("{username}", &bindings), "x");
    }

    #[test]
    fn test_render_both_placeholders() {
        let bindings = Bindings::new("abc rest", "viewer");
        assert_eq!(
            render("!bsr {userinput} requested by {username}", &bindings),
            "!bsr abc rest requested by viewer"
        );
    }

    #[test]
    fn test_repeated_placeholders() {
        let bindings = Bindings::new("a", "b");
        assert_eq!(render("{userinput}{userinput}-{username}", &bindings), "aa-b");
    }

    #[test]
    fn test_unknown_placeholder_passes_through() {
        let bindings = Bindings::new("a", "b");
        assert_eq!(render("{user} {args} {userinput}", &bindings), "{user} {args} a");
    }

    #[test]
    fn test_no_placeholders_is_identity() {
        let bindings = Bindings::new("a", "b");
        let text = "nothing to see here";
        assert_eq!(render(text, &bindings), text);
        assert_eq!(render(&render(text, &bindings), &bindings), text);
    }

    #[test]
    fn test_empty_bindings_substitute_empty_string() {
        assert_eq!(render("hi {username}!", &Bindings::default()), "hi !");
    }
}
