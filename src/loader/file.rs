//! # Data Files
//!
//! Metadata for an uploaded delimited file. The list of column names is kept
//! as a single string joined by the file's delimiter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use super::errors::{LoaderError, LoaderResult};
use super::feed::Feed;
use super::names::validate_name;

/// Storage path for a file: `{feed_name}/{YYYYMMDD}/{file_name}`
pub fn path_for(feed_name: &str, upload_date: NaiveDate, file_name: &str) -> String {
    format!("{}/{}/{}", feed_name, upload_date.format("%Y%m%d"), file_name)
}

/// A single-character column delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delimiter(char);

impl Delimiter {
    pub const COMMA: Delimiter = Delimiter(',');

    /// Parse a delimiter; anything other than exactly one character is rejected
    pub fn new(s: &str) -> LoaderResult<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self(c)),
            _ => Err(LoaderError::MalformedDelimiter(s.to_string())),
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::COMMA
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Delimiter {
    type Error = LoaderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Delimiter::new(&value)
    }
}

impl From<Delimiter> for String {
    fn from(d: Delimiter) -> Self {
        d.0.to_string()
    }
}

/// An uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFile {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    /// Location of the payload in the storage backend
    pub data_path: String,
    pub size: u64,
    pub checksum: String,
    upload_date: DateTime<Utc>,
    delimiter: Delimiter,
    columns: String,
}

impl DataFile {
    pub fn builder<'a>() -> DataFileBuilder<'a> {
        DataFileBuilder::default()
    }

    /// Calculate checksum for data
    pub fn calculate_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Set when the record is built, never afterwards
    pub fn upload_date(&self) -> DateTime<Utc> {
        self.upload_date
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// The stored, delimiter-joined column string
    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn get_columns(&self) -> Vec<String> {
        if self.columns.is_empty() {
            return Vec::new();
        }
        self.columns
            .split(self.delimiter.as_char())
            .map(str::to_string)
            .collect()
    }

    /// Store the column names joined by the current delimiter.
    ///
    /// Names that are empty or contain the delimiter could not be read back
    /// by `get_columns`, so they are rejected.
    pub fn set_columns<I, S>(&mut self, names: I) -> LoaderResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns = join_columns(names, self.delimiter)?;
        Ok(())
    }

    /// Switch delimiter, re-joining the existing column list with it
    pub fn set_delimiter(&mut self, delimiter: Delimiter) -> LoaderResult<()> {
        let names = self.get_columns();
        self.columns = join_columns(&names, delimiter)?;
        self.delimiter = delimiter;
        Ok(())
    }

    /// Check that the uploader is authorized for `feed`.
    ///
    /// This is the authorization gate for uploads; `feed` must be the feed
    /// this file belongs to.
    pub fn validate(&self, feed: &Feed) -> LoaderResult<()> {
        if feed.id != self.feed_id {
            return Err(LoaderError::Internal(format!(
                "file {} does not belong to feed '{}'",
                self.id, feed.name
            )));
        }

        if !feed.has_user(&self.user_id) {
            return Err(LoaderError::Unauthorized {
                user_id: self.user_id,
                feed: feed.name.clone(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for DataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.upload_date.format("%Y%m%d"), self.file_name)
    }
}

fn join_columns<I, S>(names: I, delimiter: Delimiter) -> LoaderResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, name) in names.into_iter().enumerate() {
        let name = name.as_ref();
        if name.is_empty() || name.contains(delimiter.as_char()) {
            return Err(LoaderError::InvalidColumnName(name.to_string()));
        }
        if i > 0 {
            joined.push(delimiter.as_char());
        }
        joined.push_str(name);
    }
    Ok(joined)
}

/// Builder for new file records
#[derive(Debug, Default)]
pub struct DataFileBuilder<'a> {
    feed: Option<&'a Feed>,
    user_id: Option<Uuid>,
    file_name: String,
    delimiter: Delimiter,
    columns: Vec<String>,
    size: u64,
    checksum: String,
}

impl<'a> DataFileBuilder<'a> {
    pub fn feed(mut self, feed: &'a Feed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = names.into_iter().map(Into::into).collect();
        self
    }

    /// Record the payload size and checksum
    pub fn data(mut self, data: &[u8]) -> Self {
        self.size = data.len() as u64;
        self.checksum = DataFile::calculate_checksum(data);
        self
    }

    /// Build the record, stamping the upload date with the current time
    pub fn build(self) -> LoaderResult<DataFile> {
        let feed = self
            .feed
            .ok_or(LoaderError::MissingRequiredReference("feed"))?;
        let user_id = self
            .user_id
            .ok_or(LoaderError::MissingRequiredReference("user"))?;
        validate_name(&self.file_name)?;

        let upload_date = Utc::now();
        let mut file = DataFile {
            id: Uuid::new_v4(),
            feed_id: feed.id,
            user_id,
            data_path: path_for(&feed.name, upload_date.date_naive(), &self.file_name),
            file_name: self.file_name,
            size: self.size,
            checksum: self.checksum,
            upload_date,
            delimiter: self.delimiter,
            columns: String::new(),
        };
        file.set_columns(&self.columns)?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_with_member() -> (Feed, Uuid) {
        let mut feed = Feed::new("test_feed".to_string()).unwrap();
        let user = Uuid::new_v4();
        feed.add_user(user);
        (feed, user)
    }

    #[test]
    fn test_path_for() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(path_for("test_feed", date, "data.csv"), "test_feed/20240305/data.csv");
    }

    #[test]
    fn test_delimiter_must_be_one_char() {
        assert_eq!(Delimiter::new("|").unwrap().as_char(), '|');
        assert_eq!(Delimiter::new("\t").unwrap().as_char(), '\t');
        assert_eq!(Delimiter::new("é").unwrap().as_char(), 'é');
        assert!(matches!(Delimiter::new(""), Err(LoaderError::MalformedDelimiter(_))));
        assert!(matches!(Delimiter::new(",,"), Err(LoaderError::MalformedDelimiter(_))));
        assert_eq!(Delimiter::default(), Delimiter::COMMA);
    }

    #[test]
    fn test_delimiter_serde_rejects_long_strings() {
        assert!(serde_json::from_str::<Delimiter>("\"ab\"").is_err());
        let d: Delimiter = serde_json::from_str("\";\"").unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\";\"");
    }

    #[test]
    fn test_build_requires_feed_and_user() {
        let (feed, user) = feed_with_member();

        let no_feed = DataFile::builder().user(user).file_name("a.csv").build();
        assert!(matches!(no_feed, Err(LoaderError::MissingRequiredReference("feed"))));

        let no_user = DataFile::builder().feed(&feed).file_name("a.csv").build();
        assert!(matches!(no_user, Err(LoaderError::MissingRequiredReference("user"))));
    }

    #[test]
    fn test_build_derives_path_and_display() {
        let (feed, user) = feed_with_member();
        let file = DataFile::builder()
            .feed(&feed)
            .user(user)
            .file_name("test.csv")
            .build()
            .unwrap();

        let day = file.upload_date().format("%Y%m%d").to_string();
        assert_eq!(file.to_string(), format!("{}/test.csv", day));
        assert_eq!(file.data_path, format!("test_feed/{}/test.csv", day));
    }

    #[test]
    fn test_validate_membership() {
        let (feed, member) = feed_with_member();
        let good = DataFile::builder().feed(&feed).user(member).file_name("a.csv").build().unwrap();
        assert!(good.validate(&feed).is_ok());

        let bad = DataFile::builder()
            .feed(&feed)
            .user(Uuid::new_v4())
            .file_name("a.csv")
            .build()
            .unwrap();
        assert!(matches!(bad.validate(&feed), Err(LoaderError::Unauthorized { .. })));
    }

    #[test]
    fn test_validate_rejects_foreign_feed() {
        let (feed, member) = feed_with_member();
        let mut other = Feed::new("other".to_string()).unwrap();
        other.add_user(member);

        let file = DataFile::builder().feed(&feed).user(member).file_name("a.csv").build().unwrap();
        assert!(matches!(file.validate(&other), Err(LoaderError::Internal(_))));
    }

    #[test]
    fn test_columns_default_empty() {
        let (feed, user) = feed_with_member();
        let file = DataFile::builder().feed(&feed).user(user).file_name("test.csv").build().unwrap();
        assert_eq!(file.columns(), "");
        assert_eq!(file.get_columns(), Vec::<String>::new());
    }

    #[test]
    fn test_set_columns_rejects_unreadable_names() {
        let (feed, user) = feed_with_member();
        let mut file = DataFile::builder().feed(&feed).user(user).file_name("t.csv").build().unwrap();
        file.set_columns(["a", "b"]).unwrap();

        assert!(matches!(file.set_columns(["a,b"]), Err(LoaderError::InvalidColumnName(_))));
        assert!(matches!(file.set_columns(["a", ""]), Err(LoaderError::InvalidColumnName(_))));
        // A failed set leaves the previous value in place
        assert_eq!(file.columns(), "a,b");
    }

    #[test]
    fn test_set_delimiter_rejoins_columns() {
        let (feed, user) = feed_with_member();
        let mut file = DataFile::builder()
            .feed(&feed)
            .user(user)
            .file_name("t.csv")
            .columns(["x", "y|z"])
            .build()
            .unwrap();
        assert_eq!(file.columns(), "x,y|z");

        assert!(file.set_delimiter(Delimiter::new("|").unwrap()).is_err());
        assert_eq!(file.delimiter(), Delimiter::COMMA);

        file.set_columns(["x", "y"]).unwrap();
        file.set_delimiter(Delimiter::new(";").unwrap()).unwrap();
        assert_eq!(file.columns(), "x;y");
        assert_eq!(file.get_columns(), vec!["x", "y"]);
    }

    #[test]
    fn test_checksum() {
        let checksum = DataFile::calculate_checksum(b"test");
        assert_eq!(checksum.len(), 64);
    }
}
