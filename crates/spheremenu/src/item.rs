use serde::{Deserialize, Serialize};

/// Entry shown on the menu.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MenuItem {
    /// Image source: a local path, a `file://` URL, or an `http(s)://` URL.
    pub image: String,
    /// Link opened when the item is activated.
    pub link: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
}
impl MenuItem {
    /// Item shown when the caller supplies none.
    pub fn placeholder() -> Self {
        Self {
            image: "https://picsum.photos/900/900?grayscale".to_string(),
            link: "https://google.com/".to_string(),
            title: String::new(),
            description: String::new(),
        }
    }

    /// Returns the link to open on activation, or `None` if the item has no
    /// meaningful link.
    pub fn activation_link(&self) -> Option<&str> {
        match self.link.trim() {
            "" | "#" => None,
            link => Some(link),
        }
    }
}
