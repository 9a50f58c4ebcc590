use crate::ast::{Condition, Param};
use crate::error::{KiwiError, KiwiResult};
use crate::transpiler::Fragment;
use crate::validator::ensure_identifier;

/// Compile a condition tree into a WHERE body and its parameters.
///
/// `And` children are joined with ` AND `, `Or` children are each
/// parenthesised and joined with ` OR `. Empty subtrees vanish, so an
/// empty tree yields an empty fragment.
pub fn compile_conditions(cond: &Condition) -> KiwiResult<Fragment> {
    let mut params = Vec::new();
    let sql = compile_node(cond, &mut params)?;
    Ok(Fragment { sql, params })
}

fn compile_node(cond: &Condition, params: &mut Vec<Param>) -> KiwiResult<String> {
    match cond {
        Condition::Compare { column, op, value } => {
            ensure_identifier("column", column)?;
            let param = value.to_param().ok_or_else(|| {
                KiwiError::invalid(format!(
                    "raw SQL cannot be compared against column '{}'",
                    column
                ))
            })?;
            params.push(param);
            Ok(format!("{} {} ?", column, op.sql()))
        }
        Condition::IsNull(column) => {
            ensure_identifier("column", column)?;
            Ok(format!("{} IS NULL", column))
        }
        Condition::And(children) => {
            let mut parts = Vec::with_capacity(children.len());
            for child in children {
                let sql = compile_node(child, params)?;
                if sql.is_empty() {
                    continue;
                }
                if is_multi_branch_or(child) {
                    parts.push(format!("({})", sql));
                } else {
                    parts.push(sql);
                }
            }
            Ok(parts.join(" AND "))
        }
        Condition::Or(children) => {
            let mut parts = Vec::with_capacity(children.len());
            for child in children {
                let sql = compile_node(child, params)?;
                if !sql.is_empty() {
                    parts.push(format!("({})", sql));
                }
            }
            Ok(parts.join(" OR "))
        }
    }
}

// An OR with two or more live branches needs parentheses inside an AND.
fn is_multi_branch_or(cond: &Condition) -> bool {
    match cond {
        Condition::Or(children) => children.iter().filter(|c| !c.is_empty()).count() > 1,
        _ => false,
    }
}
