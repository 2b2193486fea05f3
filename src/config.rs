use crate::cli::{Args, ColorChoice};
use crate::interpreter::EvalLimits;

/// Stack of the thread the CLI evaluates on.
pub const EVAL_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Part of [`EVAL_STACK_SIZE`] the nesting limit is sized for; the rest is
/// headroom for frames larger than estimated.
pub const NESTING_STACK_BUDGET: usize = EVAL_STACK_SIZE / 4;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub dump_ast: bool,
    pub limits: EvalLimits,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            dump_ast: args.dump_ast,
            limits: EvalLimits {
                max_depth: args.max_depth,
                max_steps: (args.max_steps > 0).then_some(args.max_steps),
                ..EvalLimits::for_stack(NESTING_STACK_BUDGET)
            },
        }
    }
}
