use super::parser::{BinOp, Expr, Program, UnOp};
use super::{MAX_STEPS, OUTPUT_VAR, PolicyError};
use crate::pools::{PoolSnapshot, PoolState};
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }
}

/// Names bound by the host that a policy may read but never assign.
const READ_ONLY: [&str; 2] = ["amount", "pools"];

/// Evaluation state for one run of a program against one snapshot.
pub struct Evaluator<'a> {
    pools: &'a PoolSnapshot,
    amount: f64,
    rng: &'a mut StdRng,
    vars: HashMap<String, Value>,
    current_pool: Option<(&'a str, &'a PoolState)>,
    steps: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(pools: &'a PoolSnapshot, amount: f64, rng: &'a mut StdRng) -> Self {
        Self {
            pools,
            amount,
            rng,
            vars: HashMap::new(),
            current_pool: None,
            steps: 0,
        }
    }

    /// Run every statement and return what `best_pool` was set to, if anything.
    pub fn run(mut self, program: &Program) -> Result<Option<String>, PolicyError> {
        for stmt in &program.stmts {
            if READ_ONLY.contains(&stmt.target.as_str()) {
                return Err(PolicyError::ReadOnly(stmt.target.clone()));
            }
            let value = self.eval(&stmt.value)?;
            self.vars.insert(stmt.target.clone(), value);
        }
        match self.vars.remove(OUTPUT_VAR) {
            None => Ok(None),
            Some(Value::Str(id)) => Ok(Some(id)),
            Some(other) => Err(PolicyError::Type(format!(
                "{OUTPUT_VAR} must be a string, got {}",
                other.kind()
            ))),
        }
    }

    fn tick(&mut self) -> Result<(), PolicyError> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return Err(PolicyError::BudgetExceeded(MAX_STEPS));
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, PolicyError> {
        self.tick()?;
        match expr {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => self.lookup(name),
            Expr::Unary(UnOp::Neg, inner) => {
                let n = self.num(inner)?;
                Ok(Value::Num(-n))
            }
            Expr::Unary(UnOp::Not, inner) => {
                let b = self.boolean(inner)?;
                Ok(Value::Bool(!b))
            }
            Expr::Binary(BinOp::And, lhs, rhs) => {
                Ok(Value::Bool(self.boolean(lhs)? && self.boolean(rhs)?))
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                Ok(Value::Bool(self.boolean(lhs)? || self.boolean(rhs)?))
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                binary(*op, l, r)
            }
            Expr::If(cond, then, otherwise) => {
                if self.boolean(cond)? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call(name, args) => self.call(name, args),
        }
    }

    fn num(&mut self, expr: &Expr) -> Result<f64, PolicyError> {
        match self.eval(expr)? {
            Value::Num(n) => Ok(n),
            other => Err(PolicyError::Type(format!("expected number, got {}", other.kind()))),
        }
    }

    fn boolean(&mut self, expr: &Expr) -> Result<bool, PolicyError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(PolicyError::Type(format!("expected bool, got {}", other.kind()))),
        }
    }

    fn string(&mut self, expr: &Expr) -> Result<String, PolicyError> {
        match self.eval(expr)? {
            Value::Str(s) => Ok(s),
            other => Err(PolicyError::Type(format!("expected string, got {}", other.kind()))),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, PolicyError> {
        if let Some((id, state)) = self.current_pool {
            match name {
                "id" => return Ok(Value::Str(id.to_string())),
                "price" => return Ok(Value::Num(state.price)),
                "fee" => return Ok(Value::Num(state.fee)),
                "gas" => return Ok(Value::Num(state.gas_cost)),
                "liquidity" => return Ok(Value::Num(state.liquidity as f64)),
                _ => {}
            }
        }
        match name {
            "amount" => Ok(Value::Num(self.amount)),
            "pools" => Ok(Value::Num(self.pools.len() as f64)),
            _ => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| PolicyError::UnknownVariable(name.to_string())),
        }
    }

    fn pool(&mut self, arg: &Expr) -> Result<&'a PoolState, PolicyError> {
        let id = self.string(arg)?;
        let pools = self.pools;
        pools.get(&id).ok_or(PolicyError::UnknownPool(id))
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Value, PolicyError> {
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(PolicyError::Arity {
                    name: name.to_string(),
                    expected,
                    got: args.len(),
                })
            }
        };
        match name {
            "price" | "fee" | "gas" | "liquidity" | "effective" => {
                arity(1)?;
                let state = self.pool(&args[0])?;
                let n = match name {
                    "price" => state.price,
                    "fee" => state.fee,
                    "gas" => state.gas_cost,
                    "liquidity" => state.liquidity as f64,
                    _ => state.effective_price(),
                };
                Ok(Value::Num(n))
            }
            "has_pool" => {
                arity(1)?;
                let id = self.string(&args[0])?;
                Ok(Value::Bool(self.pools.contains(&id)))
            }
            "pool_count" => {
                arity(0)?;
                Ok(Value::Num(self.pools.len() as f64))
            }
            "random" => {
                arity(0)?;
                Ok(Value::Num(self.rng.gen_range(0.0..1.0)))
            }
            "uniform" => {
                arity(2)?;
                let lo = self.num(&args[0])?;
                let hi = self.num(&args[1])?;
                // `gen_range` panics when the span itself overflows.
                if !lo.is_finite() || !hi.is_finite() || lo > hi || !(hi - lo).is_finite() {
                    return Err(PolicyError::InvalidRange(lo, hi));
                }
                if lo == hi {
                    return Ok(Value::Num(lo));
                }
                Ok(Value::Num(self.rng.gen_range(lo..hi)))
            }
            "min" | "max" => {
                arity(2)?;
                let a = self.num(&args[0])?;
                let b = self.num(&args[1])?;
                Ok(Value::Num(if name == "min" { a.min(b) } else { a.max(b) }))
            }
            "abs" => {
                arity(1)?;
                Ok(Value::Num(self.num(&args[0])?.abs()))
            }
            "best_by" | "worst_by" => {
                arity(1)?;
                self.rank_pools(&args[0], name == "best_by")
            }
            _ => Err(PolicyError::UnknownFunction(name.to_string())),
        }
    }

    /// Score every pool with `score` and return the id of the first best one.
    fn rank_pools(&mut self, score: &Expr, highest: bool) -> Result<Value, PolicyError> {
        let outer = self.current_pool;
        let pools = self.pools;
        let mut best: Option<(&str, f64)> = None;
        for (id, state) in pools.iter() {
            self.current_pool = Some((id, state));
            let s = self.num(score);
            let s = match s {
                Ok(s) => s,
                Err(e) => {
                    self.current_pool = outer;
                    return Err(e);
                }
            };
            if s.is_nan() {
                self.current_pool = outer;
                return Err(PolicyError::NonFinite);
            }
            let better = match best {
                None => true,
                Some((_, b)) if highest => s > b,
                Some((_, b)) => s < b,
            };
            if better {
                best = Some((id, s));
            }
        }
        self.current_pool = outer;
        best.map(|(id, _)| Value::Str(id.to_string()))
            .ok_or(PolicyError::UnknownPool(String::new()))
    }
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, PolicyError> {
    match (op, &l, &r) {
        (BinOp::Eq, _, _) => Ok(Value::Bool(l == r)),
        (BinOp::Ne, _, _) => Ok(Value::Bool(l != r)),
        (_, Value::Num(a), Value::Num(b)) => {
            let (a, b) = (*a, *b);
            let out = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => {
                    if b == 0.0 {
                        return Err(PolicyError::DivisionByZero);
                    }
                    a / b
                }
                BinOp::Lt => return Ok(Value::Bool(a < b)),
                BinOp::Le => return Ok(Value::Bool(a <= b)),
                BinOp::Gt => return Ok(Value::Bool(a > b)),
                BinOp::Ge => return Ok(Value::Bool(a >= b)),
                BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or => {
                    unreachable!("handled before numeric dispatch")
                }
            };
            if out.is_finite() {
                Ok(Value::Num(out))
            } else {
                Err(PolicyError::NonFinite)
            }
        }
        _ => Err(PolicyError::Type(format!(
            "cannot apply {op:?} to {} and {}",
            l.kind(),
            r.kind()
        ))),
    }
}
