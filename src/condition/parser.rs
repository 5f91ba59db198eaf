//! Parser for the condition mini-language:
//!
//! ```text
//! expr := term (("AND"|"OR") term)*
//! term := leaf | "(" expr ")"
//! leaf := [quantity[+|-]] name ["IN" ("Hand"|"Deck")]
//! ```
//!
//! Connectives bind left to right. A bare quantity means exactly, `+` at
//! least, `-` at most; without a quantity the leaf is `1+`.

use crate::condition::tree::{Condition, Location, Operator};
use crate::condition::ConditionError;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open(usize),
    Close(usize),
    Word(String, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

fn connective(word: &str) -> Option<Connective> {
    if word.eq_ignore_ascii_case("AND") {
        Some(Connective::And)
    } else if word.eq_ignore_ascii_case("OR") {
        Some(Connective::Or)
    } else {
        None
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut word_start = 0;

    fn flush(word: &mut String, start: usize, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word), start));
        }
    }

    for (pos, ch) in input.char_indices() {
        match ch {
            '(' | ')' => {
                flush(&mut word, word_start, &mut tokens);
                tokens.push(if ch == '(' { Token::Open(pos) } else { Token::Close(pos) });
            }
            c if c.is_whitespace() => flush(&mut word, word_start, &mut tokens),
            c => {
                if word.is_empty() {
                    word_start = pos;
                }
                word.push(c);
            }
        }
    }
    flush(&mut word, word_start, &mut tokens);
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn unexpected(&self) -> ConditionError {
        match self.peek() {
            Some(Token::Open(p)) => ConditionError::UnexpectedToken { token: "(".to_string(), position: *p },
            Some(Token::Close(p)) => ConditionError::UnexpectedToken { token: ")".to_string(), position: *p },
            Some(Token::Word(w, p)) => ConditionError::UnexpectedToken { token: w.clone(), position: *p },
            None => ConditionError::UnexpectedToken {
                token: "end of input".to_string(),
                position: self.end,
            },
        }
    }

    fn parse_expr(&mut self) -> Result<Condition, ConditionError> {
        let mut left = self.parse_term()?;
        // Connective of the node built by this loop, so only our own chain is flattened
        let mut chain: Option<Connective> = None;

        while let Some(Token::Word(word, _)) = self.peek() {
            let Some(op) = connective(word) else {
                return Err(self.unexpected());
            };
            self.pos += 1;
            let right = self.parse_term()?;

            left = match (chain, op, left) {
                (Some(Connective::And), Connective::And, Condition::And(node)) => {
                    let mut children = node.children().to_vec();
                    children.push(right);
                    Condition::and(children)
                }
                (Some(Connective::Or), Connective::Or, Condition::Or(node)) => {
                    let mut children = node.children().to_vec();
                    children.push(right);
                    Condition::or(children)
                }
                (_, Connective::And, left) => Condition::and(vec![left, right]),
                (_, Connective::Or, left) => Condition::or(vec![left, right]),
            };
            chain = Some(op);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Condition, ConditionError> {
        match self.peek() {
            Some(Token::Open(_)) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                match self.peek() {
                    Some(Token::Close(_)) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(ConditionError::UnbalancedParentheses),
                }
            }
            Some(Token::Word(word, _)) if connective(word).is_none() => self.parse_leaf(),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_leaf(&mut self) -> Result<Condition, ConditionError> {
        let mut words: Vec<(String, usize)> = Vec::new();
        while let Some(Token::Word(word, pos)) = self.peek() {
            if connective(word).is_some() {
                break;
            }
            words.push((word.clone(), *pos));
            self.pos += 1;
        }
        let start = words.first().map(|(_, p)| *p).unwrap_or(self.end);

        let mut quantity = 1;
        let mut operator = Operator::AtLeast;
        let mut rest: &[(String, usize)] = &words;

        if let Some((first, _)) = words.first() {
            if first.starts_with(|c: char| c.is_ascii_digit()) {
                let digits_end = first
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(first.len());
                let (digits, suffix) = first.split_at(digits_end);
                quantity = digits
                    .parse()
                    .map_err(|_| ConditionError::InvalidQuantity(first.clone()))?;
                operator = Operator::from_suffix(suffix)?;
                rest = &words[1..];
            }
        }

        let mut location = Location::Hand;
        if rest.len() >= 2 && rest[rest.len() - 2].0.eq_ignore_ascii_case("IN") {
            location = Location::parse_lenient(&rest[rest.len() - 1].0);
            rest = &rest[..rest.len() - 2];
        }

        if rest.is_empty() {
            return Err(ConditionError::MissingCardName(start));
        }
        let name = rest
            .iter()
            .map(|(w, _)| w.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Condition::card(&name, quantity, operator, location))
    }
}

/// Parse a condition string into a fresh tree with zeroed counters
pub fn parse_condition(input: &str) -> Result<Condition, ConditionError> {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return Err(ConditionError::EmptyExpression);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let condition = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(condition),
        Some(Token::Close(_)) => Err(ConditionError::UnbalancedParentheses),
        Some(_) => Err(parser.unexpected()),
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_condition(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(cond: &Condition) -> &crate::condition::CardCondition {
        match cond {
            Condition::Card(leaf) => leaf,
            other => panic!("expected a leaf, got {}", other),
        }
    }

    #[test]
    fn test_quantity_suffixes() {
        let at_least = parse_condition("2+ Combo Piece").expect("parse");
        let l = leaf(&at_least);
        assert_eq!(l.target, "Combo Piece");
        assert_eq!(l.quantity, 2);
        assert_eq!(l.operator, Operator::AtLeast);
        assert_eq!(l.location, Location::Hand);

        assert_eq!(leaf(&parse_condition("1 Ash Blossom").expect("parse")).operator, Operator::Exactly);
        assert_eq!(leaf(&parse_condition("0- Brick").expect("parse")).operator, Operator::AtMost);
    }

    #[test]
    fn test_default_quantity() {
        let cond = parse_condition("Pot of Desires").expect("parse");
        let l = leaf(&cond);
        assert_eq!(l.target, "Pot of Desires");
        assert_eq!(l.quantity, 1);
        assert_eq!(l.operator, Operator::AtLeast);
    }

    #[test]
    fn test_location() {
        let cond = parse_condition("3- Garnet IN Deck").expect("parse");
        let l = leaf(&cond);
        assert_eq!(l.target, "Garnet");
        assert_eq!(l.location, Location::Deck);

        // Unknown zones fall back to the hand
        let cond = parse_condition("1+ Garnet in Graveyard").expect("parse");
        assert_eq!(leaf(&cond).location, Location::Hand);
    }

    #[test]
    fn test_left_to_right_binding() {
        let cond = parse_condition("A AND B OR C").expect("parse");
        assert!(matches!(cond, Condition::Or(_)));
        assert!(matches!(cond.children()[0], Condition::And(_)));
        assert_eq!(cond.to_string(), "(1+ A AND 1+ B) OR 1+ C");
    }

    #[test]
    fn test_chains_are_flattened() {
        let cond = parse_condition("A and B and C").expect("parse");
        assert!(matches!(cond, Condition::And(_)));
        assert_eq!(cond.children().len(), 3);
    }

    #[test]
    fn test_grouping_kept() {
        let cond = parse_condition("(A AND B) AND C").expect("parse");
        assert_eq!(cond.children().len(), 2);

        let cond = parse_condition("2+ Starter AND (1 Extender OR 1+ Hand Trap)").expect("parse");
        assert_eq!(cond.to_string(), "2+ Starter AND (1 Extender OR 1+ Hand Trap)");
    }

    #[test]
    fn test_round_trip_through_display() {
        let text = "(1+ A OR 2 B IN Deck) AND 0- C";
        let cond = parse_condition(text).expect("parse");
        assert_eq!(parse_condition(&cond.to_string()).expect("reparse"), cond);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_condition("   "), Err(ConditionError::EmptyExpression));
        assert_eq!(
            parse_condition("2* Combo Piece"),
            Err(ConditionError::UnknownOperator("*".to_string()))
        );
        assert_eq!(parse_condition("(A AND B"), Err(ConditionError::UnbalancedParentheses));
        assert_eq!(parse_condition("A AND B)"), Err(ConditionError::UnbalancedParentheses));
        assert_eq!(parse_condition("2+"), Err(ConditionError::MissingCardName(0)));
        assert!(matches!(
            parse_condition("A AND"),
            Err(ConditionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_condition("OR A"),
            Err(ConditionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_condition("99999999999+ A"),
            Err(ConditionError::InvalidQuantity(_))
        ));
    }
}
