use crate::common::*;

/// Categorical label tensor with an optional category name list.
///
/// The category list is ordered and only used for display and debugging.
#[derive(Debug)]
pub struct Label {
    pub(crate) data: Tensor,
    pub(crate) categories: Option<Vec<String>>,
}

impl Label {
    pub fn new(data: Tensor, categories: Option<Vec<String>>) -> Result<Self> {
        ensure!(
            matches!(
                data.kind(),
                Kind::Uint8 | Kind::Int8 | Kind::Int16 | Kind::Int | Kind::Int64
            ),
            "label tensor must have an integral kind, but get {:?}",
            data.kind()
        );
        Ok(Self { data, categories })
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn into_data(self) -> Tensor {
        self.data
    }

    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_deref()
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Tensor) -> Tensor,
    {
        Self {
            data: f(self.data),
            categories: self.categories,
        }
    }

    pub fn shallow_clone(&self) -> Self {
        Self {
            data: self.data.shallow_clone(),
            categories: self.categories.clone(),
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.categories == other.categories
    }
}

/// One-hot encoded label tensor in `[..., num_categories]` layout.
#[derive(Debug)]
pub struct OneHotLabel {
    pub(crate) data: Tensor,
    pub(crate) categories: Option<Vec<String>>,
}

impl OneHotLabel {
    pub fn new(data: Tensor, categories: Option<Vec<String>>) -> Result<Self> {
        ensure!(
            data.dim() >= 1,
            "one-hot label tensor must have at least 1 dimension"
        );
        if let Some(categories) = &categories {
            let num_categories = *data.size().last().unwrap_or(&0);
            ensure!(
                categories.len() as i64 == num_categories,
                "the category list length {} does not match the last dimension {}",
                categories.len(),
                num_categories
            );
        }
        Ok(Self { data, categories })
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn into_data(self) -> Tensor {
        self.data
    }

    pub fn num_categories(&self) -> i64 {
        let size = self.data.size();
        size[size.len() - 1]
    }

    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_deref()
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Tensor) -> Tensor,
    {
        Self {
            data: f(self.data),
            categories: self.categories,
        }
    }

    pub fn shallow_clone(&self) -> Self {
        Self {
            data: self.data.shallow_clone(),
            categories: self.categories.clone(),
        }
    }
}

impl PartialEq for OneHotLabel {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.categories == other.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_requires_integral_kind() {
        assert!(Label::new(Tensor::zeros(&[4], tch::kind::INT64_CPU), None).is_ok());
        assert!(Label::new(Tensor::zeros(&[4], tch::kind::FLOAT_CPU), None).is_err());
    }

    #[test]
    fn one_hot_category_arity() {
        let data = Tensor::zeros(&[2, 3], tch::kind::FLOAT_CPU);
        assert!(OneHotLabel::new(data.shallow_clone(), None).is_ok());
        let names = vec!["a".to_owned(), "b".to_owned()];
        assert!(OneHotLabel::new(data, Some(names)).is_err());
    }
}
