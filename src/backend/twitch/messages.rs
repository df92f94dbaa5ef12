/// One line of Twitch IRC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// Sender prefix without the leading ':'
    pub prefix: Option<String>,
    pub command: String,
    /// Middle params followed by the trailing param, if any
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse `[@tags] [:prefix] COMMAND [params] [:trailing]`
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(&['\r', '\n'][..]);

        if rest.starts_with('@') {
            let (_, after) = rest.split_once(' ')?;
            rest = after;
        }

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, after) = stripped.split_once(' ')?;
                rest = after;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };

        let mut parts = head.split_whitespace();
        let command = parts.next()?.to_string();
        let mut params: Vec<String> = parts.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nickname part of the prefix (`nick!user@host`)
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split('!').next().unwrap_or(p))
    }

    /// Last param, which carries the text for PRIVMSG/NOTICE/PING
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

/// Build a PRIVMSG line; newlines are flattened so one call is one message
pub fn privmsg(channel: &str, text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!("PRIVMSG #{} :{}", channel, text)
}
