use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use uuid::Uuid;

/// Largest accepted image upload. Phone photos run well past axum's 2 MB
/// default body limit.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// An image file pulled out of a multipart submission.
#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Fields of a recipe submission. Everything is optional at the collection
/// stage; create and edit decide what is required.
#[derive(Default)]
pub struct RecipeForm {
    pub title: Option<String>,
    pub instructions: Option<String>,
    pub category_id: Option<Uuid>,
    pub image: Option<UploadedImage>,
}

/// A creation submission with every required field present and trimmed.
#[derive(Debug)]
pub struct NewRecipeFields {
    pub title: String,
    pub instructions: String,
    pub category_id: Uuid,
    pub image: UploadedImage,
}

/// Required-field validation for creation. Runs before any storage write,
/// so a rejected submission leaves nothing behind.
pub fn validate_new(form: RecipeForm) -> Result<NewRecipeFields, String> {
    let title = match form.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err("Title cannot be empty".to_string()),
    };

    let instructions = match form.instructions.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err("Instructions cannot be empty".to_string()),
    };

    let category_id = form
        .category_id
        .ok_or_else(|| "A category is required".to_string())?;

    let image = form
        .image
        .ok_or_else(|| "An image file is required".to_string())?;

    Ok(NewRecipeFields {
        title,
        instructions,
        category_id,
        image,
    })
}

fn parse_category_id(text: &str) -> Result<Uuid, String> {
    let text = text.trim();
    Uuid::parse_str(text).map_err(|_| format!("Invalid category id: {}", text))
}

/// Browsers send an empty file part when no image was chosen; that counts
/// as no upload at all.
fn uploaded_image(file_name: Option<String>, data: Vec<u8>) -> Option<UploadedImage> {
    match file_name {
        Some(file_name) if !file_name.is_empty() && !data.is_empty() => {
            Some(UploadedImage { file_name, data })
        }
        _ => None,
    }
}

fn too_large_message() -> String {
    format!("File too large. Maximum size is {} bytes", MAX_UPLOAD_BYTES)
}

fn read_error(e: &MultipartError) -> String {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large_message()
    } else {
        format!("Failed to read multipart data: {}", e.body_text())
    }
}

/// Drains the multipart body into a [`RecipeForm`]. Unknown parts are
/// ignored.
pub async fn collect(mut multipart: Multipart) -> Result<RecipeForm, String> {
    let mut form = RecipeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| read_error(&e))? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                form.title = Some(field.text().await.map_err(|e| read_error(&e))?);
            }
            Some("instructions") => {
                form.instructions = Some(field.text().await.map_err(|e| read_error(&e))?);
            }
            Some("category_id") => {
                let text = field.text().await.map_err(|e| read_error(&e))?;
                form.category_id = Some(parse_category_id(&text)?);
            }
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|e| read_error(&e))?;
                form.image = uploaded_image(file_name, data.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> RecipeForm {
        RecipeForm {
            title: Some("Soup".to_string()),
            instructions: Some("Simmer.".to_string()),
            category_id: Some(Uuid::new_v4()),
            image: Some(UploadedImage {
                file_name: "photo.JPG".to_string(),
                data: b"bytes".to_vec(),
            }),
        }
    }

    #[test]
    fn test_validate_new_accepts_full_form() {
        let fields = validate_new(full_form()).unwrap();
        assert_eq!(fields.title, "Soup");
        assert_eq!(fields.instructions, "Simmer.");
        assert_eq!(fields.image.file_name, "photo.JPG");
    }

    #[test]
    fn test_validate_new_trims_text_fields() {
        let mut form = full_form();
        form.title = Some("  Soup  ".to_string());
        form.instructions = Some("\tSimmer.\n".to_string());
        let fields = validate_new(form).unwrap();
        assert_eq!(fields.title, "Soup");
        assert_eq!(fields.instructions, "Simmer.");
    }

    #[test]
    fn test_validate_new_rejects_missing_or_blank_title() {
        let mut form = full_form();
        form.title = None;
        assert_eq!(validate_new(form).unwrap_err(), "Title cannot be empty");

        let mut form = full_form();
        form.title = Some("   ".to_string());
        assert_eq!(validate_new(form).unwrap_err(), "Title cannot be empty");
    }

    #[test]
    fn test_validate_new_rejects_missing_instructions() {
        let mut form = full_form();
        form.instructions = None;
        assert_eq!(
            validate_new(form).unwrap_err(),
            "Instructions cannot be empty"
        );
    }

    #[test]
    fn test_validate_new_rejects_missing_category() {
        let mut form = full_form();
        form.category_id = None;
        assert_eq!(validate_new(form).unwrap_err(), "A category is required");
    }

    #[test]
    fn test_validate_new_rejects_missing_image() {
        let mut form = full_form();
        form.image = None;
        assert_eq!(validate_new(form).unwrap_err(), "An image file is required");
    }

    #[test]
    fn test_parse_category_id_accepts_uuid_with_whitespace() {
        let id = Uuid::new_v4();
        assert_eq!(parse_category_id(&format!("  {}  ", id)).unwrap(), id);
    }

    #[test]
    fn test_parse_category_id_rejects_garbage() {
        let err = parse_category_id("3").unwrap_err();
        assert_eq!(err, "Invalid category id: 3");
    }

    #[test]
    fn test_empty_file_part_counts_as_absent() {
        // No filename at all
        assert!(uploaded_image(None, b"bytes".to_vec()).is_none());
        // Empty filename
        assert!(uploaded_image(Some(String::new()), b"bytes".to_vec()).is_none());
        // Filename but no bytes
        assert!(uploaded_image(Some("photo.jpg".to_string()), Vec::new()).is_none());
    }

    #[test]
    fn test_real_file_part_is_kept() {
        let image = uploaded_image(Some("photo.jpg".to_string()), b"bytes".to_vec()).unwrap();
        assert_eq!(image.file_name, "photo.jpg");
        assert_eq!(image.data, b"bytes");
    }

    #[test]
    fn test_too_large_message_names_the_limit() {
        assert_eq!(
            too_large_message(),
            format!("File too large. Maximum size is {} bytes", MAX_UPLOAD_BYTES)
        );
    }
}
