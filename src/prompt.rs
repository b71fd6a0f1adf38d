use colored::Colorize;

pub struct Prompt {
    default_name: String,
    name: String,
}

impl Prompt {
    pub fn new(default_name: &str) -> Self {
        Self {
            default_name: default_name.to_string(),
            name: default_name.to_string(),
        }
    }

    /// `None` (or an empty word) restores the default name.
    pub fn set(&mut self, name: Option<&str>) {
        self.name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.default_name.clone(),
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_string(&self) -> String {
        format!("{}> ", self.name)
    }

    pub fn colored_string(&self) -> String {
        format!("{} ", self.get_string().trim_end().bold().green())
    }
}
