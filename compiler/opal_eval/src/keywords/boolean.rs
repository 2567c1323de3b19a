//! Boolean connectives. Operands are evaluated and coerced by truthiness
//! before the handler sees them.

use super::{Keyword, KeywordTable};

pub(super) fn register(table: &mut KeywordTable) {
    let binary = |handler: fn(&[bool]) -> bool| Keyword::BooleanCoerced { arity: 2, handler };
    table.insert("and", binary(|b| b[0] && b[1]));
    table.insert("or", binary(|b| b[0] || b[1]));
    table.insert("nor", binary(|b| !(b[0] || b[1])));
    table.insert("xor", binary(|b| b[0] != b[1]));
    table.insert("nand", binary(|b| !(b[0] && b[1])));
    table.insert(
        "not",
        Keyword::BooleanCoerced {
            arity: 1,
            handler: |b| !b[0],
        },
    );
}
