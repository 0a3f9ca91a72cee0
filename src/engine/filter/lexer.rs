//! Filter expression tokenizer

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Keyword, address or name
    Word(String),
    Num(u32),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Bang,
    AndAnd,
    OrOr,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Word(w) => return write!(f, "'{}'", w),
            Token::Num(n) => return write!(f, "'{}'", n),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Colon => ":",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::Eq => "=",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Bang => "!",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
        };
        write!(f, "'{}'", s)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Split an expression into tokens.
///
/// Inside `[...]` a colon separates offset and size; outside brackets it
/// is part of a word so IPv6 and MAC addresses lex as one token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if is_word_char(c) || (c == ':' && depth == 0) {
            let start = i;
            while i < chars.len() && (is_word_char(chars[i]) || (chars[i] == ':' && depth == 0)) {
                i += 1;
            }
            let mut word: String = chars[start..i].iter().collect();

            // tcp-syn, icmp-echo and friends are single tokens
            if (word == "tcp" || word == "icmp")
                && chars.get(i) == Some(&'-')
                && chars.get(i + 1).is_some_and(|c| c.is_ascii_alphabetic())
            {
                i += 1;
                let rest_start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                word.push('-');
                word.extend(&chars[rest_start..i]);
            }

            tokens.push(classify(word)?);
            continue;
        }

        let (token, width) = match (c, next) {
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => {
                depth += 1;
                (Token::LBracket, 1)
            }
            (']', _) => {
                depth = depth.saturating_sub(1);
                (Token::RBracket, 1)
            }
            (':', _) => (Token::Colon, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('^', _) => (Token::Caret, 1),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('&', _) => (Token::Amp, 1),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('|', _) => (Token::Pipe, 1),
            ('<', Some('<')) => (Token::Shl, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('>')) => (Token::Shr, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('>', _) => (Token::Gt, 1),
            ('=', Some('=')) => (Token::Eq, 2),
            ('=', _) => (Token::Eq, 1),
            ('!', Some('=')) => (Token::Ne, 2),
            ('!', _) => (Token::Bang, 1),
            (other, _) => return Err(format!("unexpected character '{}'", other)),
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

/// Numbers are decimal, `0x` hex or leading-zero octal; anything else
/// stays a word.
fn classify(word: String) -> Result<Token, String> {
    let parsed = if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Token::Word(word));
        }
        u32::from_str_radix(hex, 16)
    } else if word.chars().all(|c| c.is_ascii_digit()) {
        if word.len() > 1 && word.starts_with('0') {
            if !word.chars().all(|c| ('0'..='7').contains(&c)) {
                return Err(format!("invalid octal number '{}'", word));
            }
            u32::from_str_radix(&word[1..], 8)
        } else {
            word.parse::<u32>()
        }
    } else {
        return Ok(Token::Word(word));
    };

    parsed
        .map(Token::Num)
        .map_err(|_| format!("number '{}' out of range", word))
}
