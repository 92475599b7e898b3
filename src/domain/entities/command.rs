/// Declarative part of a command registration
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Command token as typed by the user, including the leading slash
    pub name: String,
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments
    pub max_args: usize,
    /// Usage line shown on arity errors, e.g. "/hello [name]"
    pub usage: String,
    /// Help category
    pub category: String,
    /// One-line description
    pub description: String,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, min_args: usize, max_args: usize) -> Self {
        let name = name.into();
        Self {
            usage: name.clone(),
            name,
            min_args,
            max_args,
            category: "plugins".to_string(),
            description: String::new(),
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether `count` arguments satisfy this command's arity range
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && count <= self.max_args
    }
}
