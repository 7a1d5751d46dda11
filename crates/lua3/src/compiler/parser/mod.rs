mod error;
mod reader;
mod text_range;
mod token_data;
mod token_kind;
mod tokenizer;

pub use error::CompileError;
pub use reader::Reader;
pub use text_range::SourceRange;
pub use token_data::Token;
pub use token_kind::TokenKind;
pub use tokenizer::Tokenizer;

/// Cursor over the token vector. Trivia never surfaces; `line` always
/// refers to the current token.
pub struct TokenStream<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    index: usize,
    current: TokenKind,
    pub line: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str) -> Result<TokenStream<'a>, CompileError> {
        let tokens = Tokenizer::new(Reader::new(text)).tokenize()?;

        let mut stream = TokenStream {
            text,
            tokens,
            index: 0,
            current: TokenKind::TkEof,
            line: 1,
        };
        stream.skip_trivia();
        stream.sync();
        Ok(stream)
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current
    }

    pub fn current_text(&self) -> &'a str {
        match self.tokens.get(self.index) {
            Some(token) => {
                &self.text[token.range.start_offset..token.range.end_offset()]
            }
            None => "<eof>",
        }
    }

    pub fn bump(&mut self) {
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        self.skip_trivia();
        self.sync();
    }

    pub fn peek_next(&self) -> TokenKind {
        let mut next = self.index + 1;
        while next < self.tokens.len() && self.tokens[next].kind.is_trivia() {
            next += 1;
        }
        match self.tokens.get(next) {
            Some(token) => token.kind,
            None => TokenKind::TkEof,
        }
    }

    fn skip_trivia(&mut self) {
        while self.index < self.tokens.len() && self.tokens[self.index].kind.is_trivia() {
            self.index += 1;
        }
    }

    fn sync(&mut self) {
        match self.tokens.get(self.index) {
            Some(token) => {
                self.current = token.kind;
                self.line = token.line;
            }
            None => {
                self.current = TokenKind::TkEof;
                if let Some(last) = self.tokens.last() {
                    self.line = last.line;
                }
            }
        }
    }
}
