//! Built-in demo surfaces. Small but real component trees that exercise
//! state slots, bindings, promotion, and validation end to end.

use std::collections::BTreeSet;

use blocks_core::primitives::{
    Actions, Button, Checkbox, CheckboxGroup, Choice, Context, DatePicker, Divider, Field, Header,
    Picker, Section, Submit, Text, TextField, View,
};
use blocks_core::{
    BlocksContext, Component, DynamicProperty, InputValidationError, Node, Responder, State,
    Surface, Tag,
};
use blocks_host::registry::BlocksRegistry;

#[derive(Clone, Copy, Debug)]
pub struct DemoInfo {
    pub name: &'static str,
    pub surface: Surface,
    pub description: &'static str,
}

pub const DEMOS: &[DemoInfo] = &[
    DemoInfo {
        name: "counter",
        surface: Surface::Message,
        description: "a message with a stateful increment button",
    },
    DemoInfo {
        name: "approval",
        surface: Surface::Modal,
        description: "a modal approval form with validation",
    },
    DemoInfo {
        name: "prefs",
        surface: Surface::Message,
        description: "a notification preferences checkbox group",
    },
];

pub fn find(name: &str) -> Option<&'static DemoInfo> {
    DEMOS.iter().find(|demo| demo.name == name)
}

/// All demos registered under their names.
pub fn registry() -> BlocksRegistry {
    let mut registry = BlocksRegistry::new();
    registry.register("counter", || Node::component(CounterDemo { count: State::new(0) }));
    registry.register("approval", || {
        Node::component(ApprovalDemo {
            reason: State::new(String::new()),
            severity: State::new(None),
            due: State::new(None),
        })
    });
    registry.register("prefs", || {
        Node::component(PrefsDemo { enabled: State::new([Tag::from("mentions")].into_iter().collect()) })
    });
    registry
}

#[derive(Clone)]
struct CounterDemo {
    count: State<i64>,
}

impl Component for CounterDemo {
    fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
        vec![&mut self.count]
    }

    fn body(&self) -> Node {
        let clicks = self.count.binding();
        Node::group(vec![
            Header::new(Text::new("Counter")).into(),
            Section::new(Text::new(format!("Current count: {}", self.count.value()))).into(),
            Actions::new(Button::new("Increment").on_action(
                move |ctx: &mut BlocksContext, responder: Responder| {
                    let current = clicks.resolve(ctx).unwrap_or_default();
                    clicks.write(ctx, current + 1);
                    responder.update();
                    Ok(())
                },
            ))
            .into(),
        ])
    }
}

#[derive(Clone)]
struct ApprovalDemo {
    reason: State<String>,
    severity: State<Option<Tag>>,
    due: State<Option<chrono::NaiveDate>>,
}

impl Component for ApprovalDemo {
    fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
        vec![&mut self.reason, &mut self.severity, &mut self.due]
    }

    fn body(&self) -> Node {
        let reason = self.reason.value().clone();
        View::new(
            "Request approval",
            Node::group(vec![
                Section::new(Node::group(vec![
                    Text::new("Approval request").bold().into(),
                    Field::new(Text::new("Requested by: you")).into(),
                    Field::new(Text::new("Channel: #approvals")).into(),
                ]))
                .into(),
                Divider.into(),
                TextField::new("Reason", self.reason.binding())
                    .placeholder("Why is this needed?")
                    .multiline()
                    .into(),
                Picker::new(
                    "Severity",
                    Node::group(vec![
                        Choice::new("Low").tag("low").into(),
                        Choice::new("High").tag("high").into(),
                        Choice::new("Urgent").tag("urgent").into(),
                    ]),
                )
                .placeholder("Pick a severity")
                .selection(self.severity.binding())
                .into(),
                DatePicker::new("Due date").binding(self.due.binding()).into(),
                Context::new(Text::new("Approvers are notified immediately.")).into(),
                Submit::new("Request").into(),
            ]),
        )
        .close_title("Cancel")
        .on_submit(move |_ctx: &mut BlocksContext, responder: Responder| {
            if reason.trim().is_empty() {
                return Err(InputValidationError::new("A reason is required.").into());
            }
            responder.clear();
            Ok(())
        })
        .into()
    }
}

#[derive(Clone)]
struct PrefsDemo {
    enabled: State<BTreeSet<Tag>>,
}

impl Component for PrefsDemo {
    fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
        vec![&mut self.enabled]
    }

    fn body(&self) -> Node {
        Node::group(vec![
            Section::new(Text::new("Choose which notifications you receive.")).into(),
            Actions::new(
                CheckboxGroup::new(
                    "Notifications",
                    Node::group(vec![
                        Checkbox::new("Mentions")
                            .description("When someone @-mentions you")
                            .tag("mentions")
                            .into(),
                        Checkbox::new("Thread replies")
                            .description("Replies in threads you follow")
                            .tag("threads")
                            .into(),
                        Checkbox::new("Daily digest")
                            .description("A summary every morning")
                            .tag("digest")
                            .into(),
                    ]),
                )
                .selection(self.enabled.binding()),
            )
            .into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use blocks_core::{BlocksContext, Surface};

    use super::{find, registry, DEMOS};

    #[test]
    fn every_listed_demo_is_registered_and_renders() {
        let registry = registry();
        for demo in DEMOS {
            let root = registry.root(demo.name).expect("demo registered");
            let mut ctx = BlocksContext::new(demo.surface);
            ctx.render(&root).expect("demo renders");
            match demo.surface {
                Surface::Modal | Surface::HomeTab => {
                    let view = ctx.finish_view().expect("demo view");
                    assert!(!view.blocks.is_empty());
                }
                Surface::Message => {
                    assert!(!ctx.finish().is_empty());
                }
            }
        }
    }

    #[test]
    fn find_is_keyed_by_name() {
        assert!(find("counter").is_some());
        assert!(find("nope").is_none());
    }
}
