//! [`ControlSignal`] — the tagged return value of one agent step.

use serde::{Deserialize, Serialize};

/// One delegation target inside a `delegate_parallel` signal.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParallelTask {
    /// Node id of the target agent.
    pub target: String,
    /// Instruction handed to the target as its seed user message.
    pub instruction: String,
    /// The tool call id on the caller's assistant message this task resolves.
    pub tool_call_id: String,
}

/// The orchestrator's instruction set: what one [`crate::frame::TaskFrame`]
/// step decided to do.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlSignal {
    /// Tool calls were executed; keep stepping the same frame.
    Continue,

    /// Delegate serially to one other agent.
    Delegate {
        /// Node id of the delegation target.
        target: String,
        /// Instruction for the target's seed user message.
        instruction: String,
        /// Tool call id this delegation resolves on return.
        tool_call_id: String,
    },

    /// Delegate to several agents concurrently.
    DelegateParallel {
        /// Targets, in declaration order — also the aggregation order.
        tasks: Vec<ParallelTask>,
    },

    /// Invoke a skill, synthesising a one-shot agent.
    UseSkill {
        /// Name of the skill to hydrate.
        skill_name: String,
        /// Raw argument string substituted for `$ARGUMENTS`.
        args: String,
        /// Tool call id this skill invocation resolves on return.
        tool_call_id: String,
    },

    /// The frame is done; `result` becomes its final answer.
    Return {
        /// The frame's final textual answer.
        result: String,
    },

    /// An unrecoverable error occurred during the step.
    Error {
        /// Human-readable error message.
        msg: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_tagged_variant() {
        let sig = ControlSignal::Delegate {
            target: "support__worker".into(),
            instruction: "do X".into(),
            tool_call_id: "call-1".into(),
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["type"], "delegate");
        assert_eq!(json["target"], "support__worker");
    }

    #[test]
    fn parallel_tasks_preserve_order() {
        let sig = ControlSignal::DelegateParallel {
            tasks: vec![
                ParallelTask {
                    target: "a".into(),
                    instruction: "i1".into(),
                    tool_call_id: "c1".into(),
                },
                ParallelTask {
                    target: "b".into(),
                    instruction: "i2".into(),
                    tool_call_id: "c2".into(),
                },
            ],
        };
        if let ControlSignal::DelegateParallel { tasks } = sig {
            assert_eq!(tasks[0].target, "a");
            assert_eq!(tasks[1].target, "b");
        } else {
            panic!("wrong variant");
        }
    }
}
