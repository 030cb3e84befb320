use super::PolicyError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Let,
    If,
    Then,
    Else,
    And,
    Or,
    Not,
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Assign,
    LParen,
    RParen,
    Comma,
    /// Statement separator: newline or `;`.
    Sep,
    Eof,
}

/// Token plus the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, PolicyError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut line = 1;
    let mut i = 0;

    let syntax = |line: usize, msg: String| PolicyError::Syntax { line, msg };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                out.push(Spanned { token: Token::Sep, line });
                line += 1;
                i += 1;
            }
            ';' => {
                out.push(Spanned { token: Token::Sep, line });
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: 1e-4, 2.5E3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| syntax(line, format!("bad number {text:?}")))?;
                out.push(Spanned { token: Token::Number(n), line });
            }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != quote && chars[i] != '\n' {
                    i += 1;
                }
                if i >= chars.len() || chars[i] != quote {
                    return Err(syntax(line, "unterminated string".into()));
                }
                let text: String = chars[start..i].iter().collect();
                out.push(Spanned { token: Token::Str(text), line });
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.as_str() {
                    "let" => Token::Let,
                    "if" => Token::If,
                    "then" => Token::Then,
                    "else" => Token::Else,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                };
                out.push(Spanned { token, line });
            }
            _ => {
                let next = chars.get(i + 1).copied();
                let (token, width) = match (c, next) {
                    ('<', Some('=')) => (Token::Le, 2),
                    ('>', Some('=')) => (Token::Ge, 2),
                    ('=', Some('=')) => (Token::EqEq, 2),
                    ('!', Some('=')) => (Token::Ne, 2),
                    ('<', _) => (Token::Lt, 1),
                    ('>', _) => (Token::Gt, 1),
                    ('=', _) => (Token::Assign, 1),
                    ('+', _) => (Token::Plus, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('*', _) => (Token::Star, 1),
                    ('/', _) => (Token::Slash, 1),
                    ('(', _) => (Token::LParen, 1),
                    (')', _) => (Token::RParen, 1),
                    (',', _) => (Token::Comma, 1),
                    _ => return Err(syntax(line, format!("unexpected character {c:?}"))),
                };
                out.push(Spanned { token, line });
                i += width;
            }
        }
    }
    out.push(Spanned { token: Token::Eof, line });
    Ok(out)
}
