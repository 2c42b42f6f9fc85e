/// A place-holder for perhaps a more detailed/robust error reporting system in
/// the future. The generator itself never fails, this only covers startup
/// plumbing like argument parsing and handler installation

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzErr {
    message: String,
}

impl FuzzErr {
    pub fn from(message: &str) -> Self {
        FuzzErr {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn display(&self) {
        println!("{}", self.message);
    }
}

impl std::fmt::Display for FuzzErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FuzzErr {}

impl From<std::io::Error> for FuzzErr {
    fn from(e: std::io::Error) -> Self {
        FuzzErr::from(&e.to_string())
    }
}
