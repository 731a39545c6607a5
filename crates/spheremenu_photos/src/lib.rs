//! Client for the photo store behind the spherical photo menu: a REST table
//! of photo records plus an object storage bucket that holds the images.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use spheremenu::MenuItem;
use ureq::config::Config;
use ureq::http::Response;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, Body, RequestBuilder};

/// Request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Storage bucket holding the images.
const BUCKET: &str = "memories";

/// Month names, in calendar order.
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Error type used for photo store requests.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error("{0}")]
    Ureq(#[from] ureq::Error),
    #[error("unknown response: {}", .0.status())]
    UnknownResponse(Response<Body>),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("photo store returned no rows")]
    EmptyResponse,
    #[error("unknown month {0:?}")]
    BadMonth(String),
    #[error("bad photo id {0:?}")]
    BadId(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Ureq(ureq::Error::Json(e))
    }
}

/// Stored photo record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Row ID. Some stores use integers and some use UUIDs.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Public URL of the image.
    pub url: String,
    /// Month name, such as `"March"`.
    pub month: String,
    /// Year.
    pub year: i32,
    /// Month number, from 1 to 12.
    pub month_num: u32,
}
impl Photo {
    /// Returns the menu entry for the photo.
    pub fn to_menu_item(&self) -> MenuItem {
        MenuItem {
            image: self.url.clone(),
            link: "#".to_string(),
            title: format!("{} {}", self.month, self.year),
            description: "A captured moment".to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        String(String),
        Number(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::String(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Photo record to insert.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    /// Public URL of the image, usually from [`PhotoStore::upload()`].
    pub url: String,
    /// Month name, such as `"March"`.
    pub month: String,
    /// Year.
    pub year: i32,
    /// Month number, from 1 to 12.
    pub month_num: u32,
}
impl NewPhoto {
    /// Constructs a record from a month name, matched case-insensitively.
    pub fn new(url: String, month: &str, year: i32) -> Result<Self, Error> {
        let index = MONTHS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(month.trim()))
            .ok_or_else(|| Error::BadMonth(month.to_owned()))?;
        Ok(Self {
            url,
            month: MONTHS[index].to_string(),
            year,
            month_num: index as u32 + 1,
        })
    }
}

/// Returns menu entries for `photos`, or a fixed set of sample entries if
/// there are none.
pub fn menu_items(photos: &[Photo]) -> Vec<MenuItem> {
    if photos.is_empty() {
        return sample_items();
    }
    photos.iter().map(Photo::to_menu_item).collect()
}

/// Sample entries shown while the store is empty.
pub fn sample_items() -> Vec<MenuItem> {
    [
        (300, "Item 1", "This is pretty cool, right?"),
        (400, "Item 2", "Beautiful moments"),
        (500, "Item 3", "Forever together"),
        (600, "Item 4", "Love is in the air"),
        (700, "Item 5", "Captured memories"),
    ]
    .into_iter()
    .map(|(size, title, description)| MenuItem {
        image: format!("https://picsum.photos/{size}/{size}?grayscale"),
        link: "#".to_string(),
        title: title.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Handle to a photo store.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    base_url: String,
    api_key: String,
    agent: Agent,
}
impl PhotoStore {
    /// Constructs a handle. This does not send any network requests.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let agent = Config::builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            base_url,
            api_key: api_key.to_owned(),
            agent,
        }
    }

    /// Lists every photo, newest first.
    ///
    /// **This method blocks and should be run on a background thread.**
    pub fn list(&self) -> Result<Vec<Photo>, Error> {
        let response = self
            .get("/rest/v1/photos?select=*&order=year.desc,month_num.desc")
            .call()?;
        Ok(check(response)?.into_body().read_json()?)
    }

    /// Inserts a photo record and returns the stored row.
    ///
    /// **This method blocks and should be run on a background thread.**
    pub fn create(&self, photo: &NewPhoto) -> Result<Photo, Error> {
        let response = self
            .post("/rest/v1/photos")
            .header("Prefer", "return=representation")
            .send_json(photo)?;
        let rows: Vec<Photo> = check(response)?.into_body().read_json()?;
        rows.into_iter().next().ok_or(Error::EmptyResponse)
    }

    /// Uploads an image under a timestamped name and returns its public URL.
    ///
    /// **This method blocks and should be run on a background thread.**
    pub fn upload(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<String, Error> {
        let millis = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let key = format!("{millis}-{}", sanitize_file_name(file_name));

        let response = self
            .post(&format!("/storage/v1/object/{BUCKET}/{key}"))
            .header("Content-Type", content_type)
            .send(bytes)?;
        check(response)?;

        log::info!("uploaded {file_name:?} as {key:?}");
        Ok(self.public_url(&key))
    }

    /// Uploads an image file and inserts a record for it.
    ///
    /// **This method blocks and should be run on a background thread.**
    pub fn upload_photo(&self, path: &Path, month: &str, year: i32) -> Result<Photo, Error> {
        // Validate before uploading anything.
        let record = NewPhoto::new(String::new(), month, year)?;
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        let url = self.upload(&file_name, content_type_for(path), &bytes)?;
        self.create(&NewPhoto { url, ..record })
    }

    /// Deletes a photo record, then its image.
    ///
    /// The two deletions are not atomic. Failing to delete the image is
    /// logged but not returned, since the record is already gone.
    ///
    /// **This method blocks and should be run on a background thread.**
    pub fn delete(&self, id: &str, url: &str) -> Result<(), Error> {
        let response = self
            .delete_request("/rest/v1/photos")
            .query("id", id_filter(id)?)
            .call()?;
        check(response)?;
        log::info!("deleted photo record {id}");

        let Some(key) = self.object_key(url) else {
            log::warn!("not deleting {url:?} because it is not in the photo bucket");
            return Ok(());
        };
        let result = self
            .delete_request(&format!("/storage/v1/object/{BUCKET}/{key}"))
            .call()
            .map_err(Error::from)
            .and_then(check);
        if let Err(e) = result {
            log::warn!("error deleting image {key:?} for photo {id}: {e}");
        }
        Ok(())
    }

    /// Returns the public URL of an object in the photo bucket.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{BUCKET}/{key}", self.base_url)
    }

    /// Returns the object key for a public URL in the photo bucket.
    fn object_key<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_url(""))
            .filter(|key| !key.is_empty())
    }

    fn authorize<B>(&self, req: RequestBuilder<B>) -> RequestBuilder<B> {
        req.header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
    fn get(&self, path: &str) -> RequestBuilder<WithoutBody> {
        self.authorize(self.agent.get(format!("{}{path}", self.base_url)))
    }
    fn post(&self, path: &str) -> RequestBuilder<WithBody> {
        self.authorize(self.agent.post(format!("{}{path}", self.base_url)))
    }
    fn delete_request(&self, path: &str) -> RequestBuilder<WithoutBody> {
        self.authorize(self.agent.delete(format!("{}{path}", self.base_url)))
    }
}

fn check(response: Response<Body>) -> Result<Response<Body>, Error> {
    match response.status().is_success() {
        true => Ok(response),
        false => Err(Error::UnknownResponse(response)),
    }
}

/// Returns the row filter matching exactly one photo id. Ids are integers or
/// UUIDs.
fn id_filter(id: &str) -> Result<String, Error> {
    match !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        true => Ok(format!("eq.{id}")),
        false => Err(Error::BadId(id.to_owned())),
    }
}

/// Replaces characters that are awkward in object keys.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_photo_ids() {
        let photos: Vec<Photo> = serde_json::from_str(
            r#"[
                {"id": 17, "url": "u1", "month": "March", "year": 2024, "month_num": 3},
                {"id": "0b7f", "url": "u2", "month": "May", "year": 2023, "month_num": 5}
            ]"#,
        )
        .unwrap();
        assert_eq!(photos[0].id, "17");
        assert_eq!(photos[1].id, "0b7f");
    }

    #[test]
    fn test_photo_menu_item() {
        let photo = Photo {
            id: "1".to_string(),
            url: "https://example.com/a.jpg".to_string(),
            month: "March".to_string(),
            year: 2024,
            month_num: 3,
        };
        assert_eq!(
            photo.to_menu_item(),
            MenuItem {
                image: "https://example.com/a.jpg".to_string(),
                link: "#".to_string(),
                title: "March 2024".to_string(),
                description: "A captured moment".to_string(),
            },
        );
        assert_eq!(photo.to_menu_item().activation_link(), None);
    }

    #[test]
    fn test_menu_items_fall_back_to_samples() {
        let items = menu_items(&[]);
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].image, "https://picsum.photos/300/300?grayscale");
    }

    #[test]
    fn test_new_photo_month() {
        let photo = NewPhoto::new("u".to_string(), " september ", 2022).unwrap();
        assert_eq!(photo.month, "September");
        assert_eq!(photo.month_num, 9);
        assert!(matches!(
            NewPhoto::new("u".to_string(), "Smarch", 2022),
            Err(Error::BadMonth(_)),
        ));
    }

    #[test]
    fn test_object_keys() {
        let store = PhotoStore::new("https://store.example.com/", "key");
        let url = store.public_url("123-a.jpg");
        assert_eq!(
            url,
            "https://store.example.com/storage/v1/object/public/memories/123-a.jpg",
        );
        assert_eq!(store.object_key(&url), Some("123-a.jpg"));
        assert_eq!(store.object_key("https://elsewhere.com/a.jpg"), None);
        assert_eq!(store.object_key(&store.public_url("")), None);
    }

    #[test]
    fn test_id_filter() {
        assert_eq!(id_filter("17").unwrap(), "eq.17");
        assert_eq!(
            id_filter("0b7f2c1e-9a4d-4c3b-8e21-5f6a7b8c9d0e").unwrap(),
            "eq.0b7f2c1e-9a4d-4c3b-8e21-5f6a7b8c9d0e",
        );
        for id in ["", "1&select=*", "1,2", "1 or 2", "in.(1,2)"] {
            assert!(matches!(id_filter(id), Err(Error::BadId(_))), "{id:?}");
        }

        // Nothing is sent for a bad id.
        let store = PhotoStore::new("http://127.0.0.1:9", "key");
        assert!(matches!(store.delete("1&id=gt.0", "u"), Err(Error::BadId(_))));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("our trip (1).JPG"), "our_trip__1_.JPG");
        assert_eq!(content_type_for(Path::new("a/b.JPG")), "image/jpeg");
    }
}
