//! Build output: the commands to run and how to read their responses.

use std::fmt;

/// Which parsing rules apply to a command's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A single service or job resource descriptor (deploy/replace output).
    ServiceOrJobDescriptor,
    /// A JSON array of traffic assignments (update-traffic output).
    TrafficAssignmentList,
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceOrJobDescriptor => write!(f, "resource descriptor"),
            Self::TrafficAssignmentList => write!(f, "traffic assignment list"),
        }
    }
}

/// One planned CLI invocation: an ordered argument vector tagged with the
/// shape its stdout will have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    pub args: Vec<String>,
    pub shape: ResponseShape,
}

impl PlannedCommand {
    pub(crate) fn new(shape: ResponseShape) -> Self {
        Self {
            args: Vec::new(),
            shape,
        }
    }

    pub(crate) fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render as a single display string, e.g. for logs and process errors.
    pub fn render(&self, program: &str) -> String {
        let mut rendered = String::from(program);
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// The ordered commands a request compiles to.
///
/// When two commands are present the second updates traffic and must only
/// run after the first has succeeded, because it assigns traffic to the
/// revision the first one creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub commands: Vec<PlannedCommand>,
}

impl CommandPlan {
    pub(crate) fn single(command: PlannedCommand) -> Self {
        Self {
            commands: vec![command],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_program_and_args() {
        let mut command = PlannedCommand::new(ResponseShape::ServiceOrJobDescriptor);
        command.args(["run", "deploy", "svc", "--format", "json"]);
        assert_eq!(
            command.render("gcloud"),
            "gcloud run deploy svc --format json"
        );
    }
}
