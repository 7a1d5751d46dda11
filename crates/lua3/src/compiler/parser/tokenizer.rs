use crate::compiler::parser::{CompileError, Reader, Token, TokenKind};

/// Tokenizes the whole source up front, trivia included. The v3 token
/// set: no hex literals, no long comments, `%` introduces an upvalue
/// reference, `[[ ... ]]` long strings nest.
pub struct Tokenizer<'a> {
    reader: Reader<'a>,
    error: Option<CompileError>,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(reader: Reader<'a>) -> Self {
        Tokenizer {
            reader,
            error: None,
            line: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = vec![];

        while !self.reader.is_eof() {
            let kind = self.lex();
            if kind == TokenKind::TkEof || self.error.is_some() {
                break;
            }

            // The stored line is the token's ending line
            tokens.push(Token::new(kind, self.reader.current_range(), self.line));
        }

        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        Ok(tokens)
    }

    fn name_to_kind(&self, name: &str) -> TokenKind {
        match name {
            "and" => TokenKind::TkAnd,
            "do" => TokenKind::TkDo,
            "else" => TokenKind::TkElse,
            "elseif" => TokenKind::TkElseIf,
            "end" => TokenKind::TkEnd,
            "function" => TokenKind::TkFunction,
            "if" => TokenKind::TkIf,
            "local" => TokenKind::TkLocal,
            "nil" => TokenKind::TkNil,
            "not" => TokenKind::TkNot,
            "or" => TokenKind::TkOr,
            "repeat" => TokenKind::TkRepeat,
            "return" => TokenKind::TkReturn,
            "then" => TokenKind::TkThen,
            "until" => TokenKind::TkUntil,
            "while" => TokenKind::TkWhile,
            _ => TokenKind::TkName,
        }
    }

    fn lex(&mut self) -> TokenKind {
        self.reader.reset_buff();

        match self.reader.current_char() {
            '\n' | '\r' => self.lex_new_line(),
            ' ' | '\t' | '\x0B' | '\x0C' => self.lex_white_space(),
            '-' => {
                self.reader.bump();

                if self.reader.current_char() != '-' {
                    return TokenKind::TkMinus;
                }

                self.reader.eat_while(|ch| ch != '\n' && ch != '\r');
                TokenKind::TkShortComment
            }
            '[' => {
                self.reader.bump();
                if self.reader.current_char() != '[' {
                    return TokenKind::TkLeftBracket;
                }
                self.reader.bump();
                self.lex_long_string()
            }
            '=' => {
                self.reader.bump();
                if self.reader.current_char() != '=' {
                    return TokenKind::TkAssign;
                }
                self.reader.bump();
                TokenKind::TkEq
            }
            '<' => {
                self.reader.bump();
                if self.reader.current_char() != '=' {
                    return TokenKind::TkLt;
                }
                self.reader.bump();
                TokenKind::TkLe
            }
            '>' => {
                self.reader.bump();
                if self.reader.current_char() != '=' {
                    return TokenKind::TkGt;
                }
                self.reader.bump();
                TokenKind::TkGe
            }
            '~' => {
                self.reader.bump();
                if self.reader.current_char() != '=' {
                    return TokenKind::TkUnknown;
                }
                self.reader.bump();
                TokenKind::TkNe
            }
            '"' | '\'' => {
                let quote = self.reader.current_char();
                self.reader.bump();
                self.lex_string(quote)
            }
            '.' => {
                if self.reader.next_char().is_ascii_digit() {
                    return self.lex_number();
                }

                self.reader.bump();
                if self.reader.current_char() != '.' {
                    return TokenKind::TkDot;
                }
                self.reader.bump();
                if self.reader.current_char() != '.' {
                    return TokenKind::TkConcat;
                }
                self.reader.bump();
                TokenKind::TkDots
            }
            '0'..='9' => self.lex_number(),
            '+' => {
                self.reader.bump();
                TokenKind::TkPlus
            }
            '*' => {
                self.reader.bump();
                TokenKind::TkMul
            }
            '/' => {
                self.reader.bump();
                TokenKind::TkDiv
            }
            '^' => {
                self.reader.bump();
                TokenKind::TkPow
            }
            '%' => {
                self.reader.bump();
                TokenKind::TkPercent
            }
            ':' => {
                self.reader.bump();
                TokenKind::TkColon
            }
            ';' => {
                self.reader.bump();
                TokenKind::TkSemicolon
            }
            ',' => {
                self.reader.bump();
                TokenKind::TkComma
            }
            '(' => {
                self.reader.bump();
                TokenKind::TkLeftParen
            }
            ')' => {
                self.reader.bump();
                TokenKind::TkRightParen
            }
            '{' => {
                self.reader.bump();
                TokenKind::TkLeftBrace
            }
            '}' => {
                self.reader.bump();
                TokenKind::TkRightBrace
            }
            ']' => {
                self.reader.bump();
                TokenKind::TkRightBracket
            }
            _ if self.reader.is_eof() => TokenKind::TkEof,
            ch if is_name_start(ch) => {
                self.reader.bump();
                self.reader.eat_while(is_name_continue);
                let name = self.reader.current_text();
                self.name_to_kind(name)
            }
            _ => {
                self.reader.bump();
                TokenKind::TkUnknown
            }
        }
    }

    fn lex_new_line(&mut self) -> TokenKind {
        match self.reader.current_char() {
            // \n or \n\r
            '\n' => {
                self.reader.bump();
                if self.reader.current_char() == '\r' {
                    self.reader.bump();
                }
            }
            // \r or \r\n
            '\r' => {
                self.reader.bump();
                if self.reader.current_char() == '\n' {
                    self.reader.bump();
                }
            }
            _ => {}
        }
        self.line += 1;

        TokenKind::TkEndOfLine
    }

    fn lex_white_space(&mut self) -> TokenKind {
        self.reader
            .eat_while(|ch| ch == ' ' || ch == '\t' || ch == '\x0B' || ch == '\x0C');
        TokenKind::TkWhitespace
    }

    fn lex_string(&mut self, quote: char) -> TokenKind {
        while !self.reader.is_eof() {
            let ch = self.reader.current_char();
            if ch == quote || ch == '\n' || ch == '\r' {
                break;
            }

            if ch != '\\' {
                self.reader.bump();
                continue;
            }

            self.reader.bump();
            match self.reader.current_char() {
                '\r' | '\n' => {
                    self.lex_new_line();
                }
                '0'..='9' => {
                    // decimal escape, at most 3 digits
                    self.reader.bump();
                    let mut count = 1;
                    while count < 3 && self.reader.current_char().is_ascii_digit() {
                        self.reader.bump();
                        count += 1;
                    }
                }
                'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '\'' | '"' => {
                    self.reader.bump();
                }
                _ => {
                    let ch = self.reader.current_char();
                    self.error(format!("invalid escape sequence near '\\{}'", ch));
                    return TokenKind::TkString;
                }
            }
        }

        if self.reader.current_char() != quote {
            self.error("unfinished string".to_string());
            return TokenKind::TkString;
        }

        self.reader.bump();
        TokenKind::TkString
    }

    // [[ ... ]] with nesting; the opening [[ is already consumed
    fn lex_long_string(&mut self) -> TokenKind {
        let mut depth = 1usize;
        while !self.reader.is_eof() {
            match self.reader.current_char() {
                '[' if self.reader.next_char() == '[' => {
                    self.reader.bump();
                    self.reader.bump();
                    depth += 1;
                }
                ']' if self.reader.next_char() == ']' => {
                    self.reader.bump();
                    self.reader.bump();
                    depth -= 1;
                    if depth == 0 {
                        return TokenKind::TkLongString;
                    }
                }
                '\n' | '\r' => {
                    self.lex_new_line();
                }
                _ => {
                    self.reader.bump();
                }
            }
        }

        self.error("unfinished long string".to_string());
        TokenKind::TkLongString
    }

    fn lex_number(&mut self) -> TokenKind {
        enum NumberState {
            Int,
            Float,
            WithExpo,
        }

        let mut state = NumberState::Int;
        let first = self.reader.current_char();
        self.reader.bump();
        if first == '.' {
            state = NumberState::Float;
        }

        while !self.reader.is_eof() {
            let ch = self.reader.current_char();
            let continue_ = match state {
                NumberState::Int => match ch {
                    '0'..='9' => true,
                    '.' => {
                        state = NumberState::Float;
                        true
                    }
                    'e' | 'E' => {
                        if matches!(self.reader.next_char(), '+' | '-') {
                            self.reader.bump();
                        }
                        state = NumberState::WithExpo;
                        true
                    }
                    _ => false,
                },
                NumberState::Float => match ch {
                    '0'..='9' => true,
                    'e' | 'E' => {
                        if matches!(self.reader.next_char(), '+' | '-') {
                            self.reader.bump();
                        }
                        state = NumberState::WithExpo;
                        true
                    }
                    _ => false,
                },
                NumberState::WithExpo => ch.is_ascii_digit(),
            };

            if continue_ {
                self.reader.bump();
            } else {
                break;
            }
        }

        if self.reader.current_char().is_alphabetic() {
            let text = self.reader.current_text().to_string();
            self.error(format!("malformed number near '{}'", text));
        }

        TokenKind::TkNumber
    }

    fn error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(CompileError::new(message, self.line));
        }
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
