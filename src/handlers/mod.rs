pub mod booking;
pub mod img;
pub mod payment_available;

use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::ColumnTrait;

use crate::response::LIKE_ESCAPE;

/// `LOWER(column) LIKE pattern ESCAPE '\'`; the pattern is expected
/// lower-cased and escaped, as `ListQuery::search_pattern` builds it
pub(crate) fn lower_like<C: ColumnTrait>(column: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}
