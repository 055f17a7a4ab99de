use std::path::Path;

use super::error::ParseError;
use super::utility::{parse_csv, read_legacy_text};

/// One business card as exported by ScanSnap Home.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRecord {
    pub name: String,
    pub company: String,
    pub department: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub fax: String,
    pub postal_code: String,
    pub address: String,
    pub url: String,
    pub notes: String,
    pub image_path: String,
    pub scan_date: String,
}

// header candidates per field, japanese export first, english export second
// order matches the fields of ScanRecord
pub const HEADER_CANDIDATES: [[&str; 2]; 14] = [
    ["名前", "name"],
    ["会社名", "company"],
    ["部署", "department"],
    ["役職", "position"],
    ["メールアドレス", "email"],
    ["電話番号", "phone"],
    ["携帯電話", "mobile"],
    ["FAX", "fax"],
    ["郵便番号", "postalCode"],
    ["住所", "address"],
    ["URL", "url"],
    ["備考", "notes"],
    ["画像パス", "imagePath"],
    ["スキャン日時", "scanDate"],
];

impl ScanRecord {
    // build a record from cells already ordered like HEADER_CANDIDATES
    fn from_columns(columns: [String; 14]) -> ScanRecord {
        let [name, company, department, position, email, phone, mobile, fax, postal_code, address, url, notes, image_path, scan_date] =
            columns;
        ScanRecord {
            name,
            company,
            department,
            position,
            email,
            phone,
            mobile,
            fax,
            postal_code,
            address,
            url,
            notes,
            image_path,
            scan_date,
        }
    }

    // the english header names, in field order
    pub fn field_names() -> [&'static str; 14] {
        HEADER_CANDIDATES.map(|[_, english]| english)
    }

    // the field values, in the same order as field_names()
    pub fn values(&self) -> [&str; 14] {
        [
            self.name.as_str(),
            self.company.as_str(),
            self.department.as_str(),
            self.position.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.mobile.as_str(),
            self.fax.as_str(),
            self.postal_code.as_str(),
            self.address.as_str(),
            self.url.as_str(),
            self.notes.as_str(),
            self.image_path.as_str(),
            self.scan_date.as_str(),
        ]
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "(No name)"
        } else {
            &self.name
        }
    }
}

// for every field, the index of the first candidate header present in the file
fn resolve_columns(header: &[String]) -> [Option<usize>; 14] {
    HEADER_CANDIDATES.map(|candidates| {
        candidates
            .iter()
            .find_map(|candidate| header.iter().position(|column| column == candidate))
    })
}

/// Reads a ScanSnap Home CSV export (cp932) into records, in file order.
///
/// Columns are matched by their Japanese header, then by their English one.
/// A field whose header is absent or whose cell is empty is left empty.
pub fn parse_scansnap_csv(path: &Path) -> Result<Vec<ScanRecord>, ParseError> {
    let text = read_legacy_text(path)?;
    let (header, rows) = parse_csv(&text)?;
    let columns = resolve_columns(&header);

    let records = rows
        .into_iter()
        .map(|row| {
            let cells = columns.map(|index| {
                index
                    .and_then(|i| row.get(i))
                    .cloned()
                    .unwrap_or_default()
            });
            ScanRecord::from_columns(cells)
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;
    use std::{fs::File, io::Write, path::PathBuf};

    fn write_cp932(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("scansnap.csv");
        let (bytes, _, unmappable) = SHIFT_JIS.encode(content);
        assert!(!unmappable);
        File::create(&path).unwrap().write_all(&bytes).unwrap();
        path
    }

    #[test]
    fn japanese_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cp932(
            &dir,
            "名前,会社名,部署,役職,メールアドレス,電話番号,携帯電話,FAX,郵便番号,住所,URL,備考,画像パス,スキャン日時\n\
             山田太郎,株式会社テスト,営業部,部長,yamada@test.com,03-1234-5678,090-1234-5678,03-1234-5679,100-0001,東京都千代田区,https://test.com,テストユーザー,image1.jpg,2024-01-15 10:30\n",
        );

        let records = parse_scansnap_csv(&path).unwrap();
        assert_eq!(
            records,
            vec![ScanRecord {
                name: "山田太郎".to_string(),
                company: "株式会社テスト".to_string(),
                department: "営業部".to_string(),
                position: "部長".to_string(),
                email: "yamada@test.com".to_string(),
                phone: "03-1234-5678".to_string(),
                mobile: "090-1234-5678".to_string(),
                fax: "03-1234-5679".to_string(),
                postal_code: "100-0001".to_string(),
                address: "東京都千代田区".to_string(),
                url: "https://test.com".to_string(),
                notes: "テストユーザー".to_string(),
                image_path: "image1.jpg".to_string(),
                scan_date: "2024-01-15 10:30".to_string(),
            }]
        );
    }

    #[test]
    fn english_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cp932(
            &dir,
            "name,company,department,position,email,phone,mobile,fax,postalCode,address,url,notes,imagePath,scanDate\n\
             John Doe,Test Inc,Sales,Manager,john@test.com,03-1234-5678,090-1234-5678,03-1234-5679,100-0001,Tokyo,https://test.com,Test user,image1.jpg,2024-01-15\n",
        );

        let records = parse_scansnap_csv(&path).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "John Doe");
        assert_eq!(record.company, "Test Inc");
        assert_eq!(record.postal_code, "100-0001");
        assert_eq!(record.image_path, "image1.jpg");
        assert_eq!(record.scan_date, "2024-01-15");
    }

    #[test]
    fn empty_cells_stay_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cp932(
            &dir,
            "名前,会社名,部署,役職,メールアドレス,電話番号,携帯電話,FAX,郵便番号,住所,URL,備考,画像パス,スキャン日時\n\
             山田太郎,,,,,,,,,,,,image1.jpg,\n",
        );

        let records = parse_scansnap_csv(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "山田太郎");
        assert_eq!(records[0].company, "");
        assert_eq!(records[0].email, "");
        assert_eq!(records[0].image_path, "image1.jpg");
        assert_eq!(records[0].scan_date, "");
    }

    #[test]
    fn missing_headers_default_to_empty_and_order_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cp932(&dir, "名前,email\n山田太郎,yamada@test.com\n\n田中花子,tanaka@test.com\n");

        let records = parse_scansnap_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "山田太郎");
        assert_eq!(records[0].email, "yamada@test.com");
        assert_eq!(records[0].company, "");
        assert_eq!(records[1].name, "田中花子");
    }

    #[test]
    fn whitespace_only_line_between_rows_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cp932(&dir, "名前,会社名\n山田,A社\n   \n田中,B社\n");

        let records = parse_scansnap_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].company, "A社");
        assert_eq!(records[1].name, "田中");
    }

    #[test]
    fn japanese_header_wins_over_english() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cp932(&dir, "name,名前\nJohn,太郎\n");

        let records = parse_scansnap_csv(&path).unwrap();
        assert_eq!(records[0].name, "太郎");
    }

    #[test]
    fn missing_file_fails() {
        let result = parse_scansnap_csv(Path::new("./non-existent.csv"));
        assert!(matches!(result, Err(ParseError::Read { .. })));
    }

    #[test]
    fn field_names_follow_value_order() {
        let record = ScanRecord {
            postal_code: "100-0001".to_string(),
            ..Default::default()
        };
        let names = ScanRecord::field_names();
        let values = record.values();
        let index = names.iter().position(|n| *n == "postalCode").unwrap();
        assert_eq!(values[index], "100-0001");
        assert_eq!(record.display_name(), "(No name)");
    }
}
